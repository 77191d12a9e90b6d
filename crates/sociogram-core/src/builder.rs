//! Interaction graph construction from ordered event groups.
//!
//! Discussion groups (threads, issues, pull requests, commit discussions)
//! produce three kinds of edge per conversational event:
//!
//! 1. **Direct reply** to the author of the event it replies to, when that
//!    event is earlier in the same group.
//! 2. **Joined discussion** to the author of every earlier conversational
//!    event. This is quadratic in the group size; `joined_discussion_window`
//!    caps how far back it looks.
//! 3. **Mention** to every username extracted from the body.
//!
//! File-history groups instead link each committer to every earlier
//! committer of the same file. Directed actions (forks, merges, assignments,
//! follows, mail) link the author to each of the event's targets in either
//! kind of group.

use std::collections::HashMap;
use std::ops::AddAssign;

use serde::Serialize;
use tracing::debug;

use sociogram_graph::{ActorId, EdgeDraft, EdgeKind, InteractionGraph};
use sociogram_ingest::{extract_mentions, Event, OrderedGroup};

/// Builder tuning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// How many earlier participants a joined-discussion pass links to;
    /// `None` links to all of them.
    pub joined_discussion_window: Option<usize>,
}

/// Edges added per policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub events: usize,
    pub direct_replies: usize,
    pub joined_discussion: usize,
    pub mentions: usize,
    pub co_edits: usize,
    pub directed: usize,
    /// Replies whose target was absent or not earlier in the group
    pub unresolved_reply_targets: usize,
}

impl BuildStats {
    pub fn edges(&self) -> usize {
        self.direct_replies + self.joined_discussion + self.mentions + self.co_edits + self.directed
    }
}

impl AddAssign for BuildStats {
    fn add_assign(&mut self, other: Self) {
        self.events += other.events;
        self.direct_replies += other.direct_replies;
        self.joined_discussion += other.joined_discussion;
        self.mentions += other.mentions;
        self.co_edits += other.co_edits;
        self.directed += other.directed;
        self.unresolved_reply_targets += other.unresolved_reply_targets;
    }
}

/// Turns ordered event groups into interaction edges.
#[derive(Debug, Clone, Default)]
pub struct InteractionGraphBuilder {
    options: BuildOptions,
}

impl InteractionGraphBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    /// Add the actors, edges and roles of one group to `graph`.
    ///
    /// Every event author becomes a node, even without edges, so a one-post
    /// thread still establishes its author.
    pub fn build_group(&self, graph: &mut InteractionGraph, group: &OrderedGroup) -> BuildStats {
        let mut stats = BuildStats {
            events: group.len(),
            ..BuildStats::default()
        };

        if group.key().is_file_history() {
            path_dependency(graph, group.events(), &mut stats);
        } else {
            self.discussion(graph, group.events(), &mut stats);
        }

        for event in group.events() {
            directed_actions(graph, event, &mut stats);
            record_roles(graph, event);
        }

        debug!(
            group = %group.key(),
            events = stats.events,
            edges = stats.edges(),
            "Built group"
        );
        stats
    }

    fn discussion(&self, graph: &mut InteractionGraph, events: &[Event], stats: &mut BuildStats) {
        // Earlier events by id, for reply resolution.
        let mut earlier: HashMap<&str, &Event> = HashMap::new();
        let mut participants: Vec<&Event> = Vec::new();

        for event in events {
            if event.kind.is_conversational() {
                if let Some(target_id) = &event.reply_target {
                    match earlier.get(target_id.as_str()) {
                        Some(target) => {
                            graph.add_edge(draft(event, target.author.clone(), EdgeKind::DirectReply));
                            stats.direct_replies += 1;
                        }
                        None => {
                            debug!(event = %event.id, target = %target_id, "Unresolved reply target");
                            stats.unresolved_reply_targets += 1;
                        }
                    }
                }

                let from = self
                    .options
                    .joined_discussion_window
                    .map_or(0, |window| participants.len().saturating_sub(window));
                for participant in &participants[from..] {
                    graph.add_edge(draft(event, participant.author.clone(), EdgeKind::JoinedDiscussion));
                    stats.joined_discussion += 1;
                }

                for mention in extract_mentions(&event.body, event.body_format) {
                    graph.add_edge(draft(event, ActorId::known(mention), EdgeKind::Mention));
                    stats.mentions += 1;
                }

                participants.push(event);
            }

            earlier.entry(event.id.as_str()).or_insert(event);
        }
    }
}

/// Each committer edits after every earlier committer of the same file.
/// Self-loops are kept here; consolidation decides whether they stay.
fn path_dependency(graph: &mut InteractionGraph, events: &[Event], stats: &mut BuildStats) {
    for (position, event) in events.iter().enumerate() {
        for earlier in &events[..position] {
            graph.add_edge(draft(event, earlier.author.clone(), EdgeKind::CoEdit));
            stats.co_edits += 1;
        }
    }
}

fn directed_actions(graph: &mut InteractionGraph, event: &Event, stats: &mut BuildStats) {
    let Some(kind) = event.kind.directed_edge() else {
        return;
    };
    if event.targets.is_empty() {
        debug!(event = %event.id, kind = %event.kind, "Directed event without targets");
    }
    for target in &event.targets {
        graph.add_edge(draft(event, target.clone(), kind));
        stats.directed += 1;
    }
}

/// Grant roles earned by the event and fill in the author's profile.
fn record_roles(graph: &mut InteractionGraph, event: &Event) {
    if let Some(role) = event.kind.author_role() {
        graph.assign_role(&event.author, role);
    }
    if let Some(role) = event.kind.target_role() {
        for target in &event.targets {
            graph.assign_role(target, role);
        }
    }

    // Unresolved authors get a node too; consolidation prunes it.
    let node = graph.ensure_actor(&event.author);
    let profile = &event.profile;
    if node.email.is_none() {
        node.email = profile.email.clone();
    }
    if node.full_name.is_none() {
        node.full_name = profile.full_name.clone();
    }
    if node.avatar_url.is_none() {
        node.avatar_url = profile.avatar_url.clone();
    }
}

fn draft(event: &Event, target: ActorId, kind: EdgeKind) -> EdgeDraft {
    EdgeDraft::new(event.author.clone(), target, kind, event.timestamp)
        .with_event(event.id.clone(), event.kind.as_str())
        .with_message(event.body.clone())
        .with_metadata(&event.extra)
}
