//! Time-series projection of a finished interaction graph.
//!
//! Every edge is one interaction event initiated by its source actor. The
//! projector turns those events into count rows indexed by the edge `start`:
//! one column per interaction type, or a single `interactions` column in
//! combined mode.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::graph::InteractionGraph;
use crate::schema::{actor_map, ActorId, EdgeKind};

/// Column name used by the combined structure.
pub const COMBINED_COLUMN: &str = "interactions";

/// Which series the caller receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Focus {
    /// One series with every actor's rows
    #[default]
    Global,
    /// One series per initiating actor
    User,
}

/// Column layout of the series.
///
/// `"combined"` collapses interaction types into one count; any other value
/// keeps one column per type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Structure {
    Combined,
    #[default]
    PerType,
}

impl Structure {
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("combined") {
            Structure::Combined
        } else {
            Structure::PerType
        }
    }
}

impl From<String> for Structure {
    fn from(value: String) -> Self {
        Structure::parse(&value)
    }
}

impl From<Structure> for String {
    fn from(value: Structure) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Structure::Combined => f.write_str("combined"),
            Structure::PerType => f.write_str("per_type"),
        }
    }
}

/// One interaction event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesRow {
    pub start: DateTime<Utc>,
    pub actor: ActorId,
    pub values: Vec<u32>,
}

/// Rows ordered by `start`, all sharing the same columns.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeSeries {
    pub columns: Vec<String>,
    pub rows: Vec<SeriesRow>,
}

impl TimeSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<u32>> {
        let index = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| row.values[index]).collect())
    }

    /// Per-column sums.
    pub fn totals(&self) -> Vec<u64> {
        let mut totals = vec![0u64; self.columns.len()];
        for row in &self.rows {
            for (total, value) in totals.iter_mut().zip(&row.values) {
                *total += u64::from(*value);
            }
        }
        totals
    }
}

/// Result of a projection, shaped by `Focus`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Projection {
    Global(TimeSeries),
    PerActor(#[serde(with = "actor_map")] BTreeMap<ActorId, TimeSeries>),
}

/// Project a graph's edges into time series.
///
/// Fails with `MissingTimestamp` on the first edge without a `start`; no
/// default time is substituted.
pub fn project(
    graph: &InteractionGraph,
    focus: Focus,
    structure: Structure,
) -> Result<Projection, GraphError> {
    let columns = columns_for(graph, structure);

    let mut by_actor: BTreeMap<ActorId, Vec<SeriesRow>> = BTreeMap::new();
    for edge in graph.edges() {
        let start = edge
            .start
            .ok_or(GraphError::MissingTimestamp { edge: edge.key })?;

        let values = match structure {
            Structure::Combined => vec![1],
            Structure::PerType => columns
                .iter()
                .map(|column| u32::from(column == edge.kind.as_str()))
                .collect(),
        };

        by_actor.entry(edge.source.clone()).or_default().push(SeriesRow {
            start,
            actor: edge.source.clone(),
            values,
        });
    }

    match focus {
        Focus::User => Ok(Projection::PerActor(
            by_actor
                .into_iter()
                .map(|(actor, rows)| (actor, sorted_series(columns.clone(), rows)))
                .collect(),
        )),
        Focus::Global => {
            // Concatenate rows, then align on the timestamp index.
            let rows = by_actor.into_values().flatten().collect();
            Ok(Projection::Global(sorted_series(columns, rows)))
        }
    }
}

fn columns_for(graph: &InteractionGraph, structure: Structure) -> Vec<String> {
    match structure {
        Structure::Combined => vec![COMBINED_COLUMN.to_string()],
        Structure::PerType => EdgeKind::ALL
            .iter()
            .filter(|kind| graph.edges().iter().any(|edge| edge.kind == **kind))
            .map(|kind| kind.as_str().to_string())
            .collect(),
    }
}

fn sorted_series(columns: Vec<String>, mut rows: Vec<SeriesRow>) -> TimeSeries {
    // Stable: same-time rows keep insertion order.
    rows.sort_by_key(|row| row.start);
    TimeSeries { columns, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EdgeDraft;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 5, day, 9, 0, 0).unwrap()
    }

    fn edge(graph: &mut InteractionGraph, from: &str, to: &str, kind: EdgeKind, day: u32) {
        graph.add_edge(EdgeDraft::new(
            ActorId::known(from),
            ActorId::known(to),
            kind,
            at(day),
        ));
    }

    #[test]
    fn test_combined_user_series_has_one_row_per_mention() {
        let mut graph = InteractionGraph::new(2024);
        edge(&mut graph, "alice", "bob", EdgeKind::Mention, 1);
        edge(&mut graph, "alice", "carol", EdgeKind::Mention, 2);

        let Projection::PerActor(series) = project(&graph, Focus::User, Structure::Combined).unwrap()
        else {
            panic!("expected per-actor projection");
        };

        let alice = &series[&ActorId::known("alice")];
        assert_eq!(alice.columns, vec![COMBINED_COLUMN.to_string()]);
        assert_eq!(alice.len(), 2);
        assert!(alice.rows.iter().all(|row| row.values == vec![1]));
        assert_eq!(alice.rows[0].start, at(1));
        assert_eq!(alice.rows[1].start, at(2));
    }

    #[test]
    fn test_per_type_columns_flag_the_edge_kind() {
        let mut graph = InteractionGraph::new(2024);
        edge(&mut graph, "alice", "bob", EdgeKind::DirectReply, 3);
        edge(&mut graph, "alice", "bob", EdgeKind::Mention, 1);

        let Projection::Global(series) = project(&graph, Focus::Global, Structure::PerType).unwrap()
        else {
            panic!("expected global projection");
        };

        assert_eq!(series.columns, vec!["direct reply", "mention"]);
        assert_eq!(series.rows[0].values, vec![0, 1]);
        assert_eq!(series.rows[1].values, vec![1, 0]);
        assert_eq!(series.totals(), vec![1, 1]);
    }

    #[test]
    fn test_global_series_concatenates_actor_rows_by_time() {
        let mut graph = InteractionGraph::new(2024);
        edge(&mut graph, "bob", "alice", EdgeKind::Mention, 2);
        edge(&mut graph, "alice", "bob", EdgeKind::Mention, 2);
        edge(&mut graph, "alice", "bob", EdgeKind::Mention, 5);
        edge(&mut graph, "carol", "bob", EdgeKind::Mention, 1);

        let Projection::Global(series) = project(&graph, Focus::Global, Structure::Combined).unwrap()
        else {
            panic!("expected global projection");
        };

        // Rows are not summed: four edges, four rows.
        assert_eq!(series.len(), 4);
        let actors: Vec<String> = series.rows.iter().map(|r| r.actor.to_string()).collect();
        assert_eq!(actors, vec!["carol", "alice", "bob", "alice"]);
        assert_eq!(series.column(COMBINED_COLUMN), Some(vec![1, 1, 1, 1]));
    }

    #[test]
    fn test_missing_start_is_an_error() {
        let mut graph = InteractionGraph::new(2024);
        edge(&mut graph, "alice", "bob", EdgeKind::Mention, 1);
        let mut draft = EdgeDraft::new(
            ActorId::known("bob"),
            ActorId::known("alice"),
            EdgeKind::Mention,
            at(2),
        );
        draft.start = None;
        let key = graph.add_edge(draft);

        assert_eq!(
            project(&graph, Focus::User, Structure::Combined),
            Err(GraphError::MissingTimestamp { edge: key })
        );
    }

    #[test]
    fn test_structure_parse_treats_unknown_values_as_per_type() {
        assert_eq!(Structure::parse("combined"), Structure::Combined);
        assert_eq!(Structure::parse("Combined "), Structure::Combined);
        assert_eq!(Structure::parse("split"), Structure::PerType);
        assert_eq!(Structure::parse(""), Structure::PerType);
    }
}
