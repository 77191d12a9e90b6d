//! Grouping and chronological ordering of events.

use std::collections::HashMap;

use crate::error::IngestError;
use crate::event::{CorrelationKey, Event};

/// Events of one correlation group, ascending by timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedGroup {
    key: CorrelationKey,
    events: Vec<Event>,
}

impl OrderedGroup {
    pub fn key(&self) -> &CorrelationKey {
        &self.key
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Always false; an ordered group holds at least one event.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Position of the event with `id`, if it is part of the group.
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.events.iter().position(|event| event.id == id)
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

/// Sort a group ascending by timestamp.
///
/// Ties keep arrival order. An empty group is an error, a single event is
/// a valid group, and every event must carry `key`.
pub fn order(key: CorrelationKey, mut events: Vec<Event>) -> Result<OrderedGroup, IngestError> {
    if events.is_empty() {
        return Err(IngestError::EmptyGroup { key });
    }
    if let Some(stray) = events.iter().find(|event| event.correlation_key != key) {
        return Err(IngestError::MixedGroup {
            event: stray.id.clone(),
            expected: key,
            found: stray.correlation_key.clone(),
        });
    }

    events.sort_by_key(|event| event.timestamp);
    Ok(OrderedGroup { key, events })
}

/// Partition events by correlation key, groups in order of first appearance.
pub fn group_by_correlation(events: Vec<Event>) -> Vec<(CorrelationKey, Vec<Event>)> {
    let mut index: HashMap<CorrelationKey, usize> = HashMap::new();
    let mut groups: Vec<(CorrelationKey, Vec<Event>)> = Vec::new();

    for event in events {
        match index.get(&event.correlation_key) {
            Some(&slot) => groups[slot].1.push(event),
            None => {
                index.insert(event.correlation_key.clone(), groups.len());
                groups.push((event.correlation_key.clone(), vec![event]));
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use chrono::{TimeZone, Utc};
    use sociogram_graph::ActorId;

    fn event(id: &str, minute: u32, thread: &str) -> Event {
        Event::new(
            id,
            Utc.with_ymd_and_hms(2021, 1, 1, 12, minute, 0).unwrap(),
            ActorId::known("someone"),
            EventKind::Post,
            CorrelationKey::Thread(thread.to_string()),
        )
    }

    fn ids(group: &OrderedGroup) -> Vec<&str> {
        group.events().iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_order_sorts_by_timestamp() {
        let key = CorrelationKey::Thread("t".into());
        let group = order(
            key.clone(),
            vec![event("c", 30, "t"), event("a", 10, "t"), event("b", 20, "t")],
        )
        .unwrap();
        assert_eq!(ids(&group), vec!["a", "b", "c"]);
        assert_eq!(group.position_of("b"), Some(1));
        assert_eq!(group.key(), &key);
    }

    #[test]
    fn test_order_is_stable_for_equal_timestamps() {
        let group = order(
            CorrelationKey::Thread("t".into()),
            vec![event("second", 5, "t"), event("first", 1, "t"), event("third", 5, "t")],
        )
        .unwrap();
        assert_eq!(ids(&group), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_empty_group_is_an_error() {
        let key = CorrelationKey::File("README.md".into());
        assert_eq!(
            order(key.clone(), Vec::new()),
            Err(IngestError::EmptyGroup { key })
        );
    }

    #[test]
    fn test_single_event_group_is_valid() {
        let group = order(CorrelationKey::Thread("t".into()), vec![event("only", 1, "t")]).unwrap();
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn test_foreign_event_is_rejected() {
        let result = order(
            CorrelationKey::Thread("t".into()),
            vec![event("a", 1, "t"), event("b", 2, "other")],
        );
        assert!(matches!(result, Err(IngestError::MixedGroup { event, .. }) if event == "b"));
    }

    #[test]
    fn test_group_by_correlation_keeps_first_appearance_order() {
        let groups = group_by_correlation(vec![
            event("1", 1, "beta"),
            event("2", 2, "alpha"),
            event("3", 3, "beta"),
        ]);
        let keys: Vec<String> = groups.iter().map(|(key, _)| key.to_string()).collect();
        assert_eq!(keys, vec!["thread:beta", "thread:alpha"]);
        assert_eq!(groups[0].1.len(), 2);
    }
}
