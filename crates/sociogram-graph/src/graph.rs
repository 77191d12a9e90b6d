//! In-memory interaction multigraph.
//!
//! `InteractionGraph` owns its nodes, its edges and the counter that hands out
//! edge keys. Every mutation goes through `&mut self`, so writers to one graph
//! are serialized by the borrow checker.

use std::collections::BTreeMap;

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GraphError;
use crate::schema::{actor_map, ActorId, EdgeDraft, InteractionEdge, NodeAttributes, Role};

/// A directed multigraph of actors and typed interaction edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionGraph {
    observation_year: i32,
    next_key: u64,
    #[serde(with = "actor_map")]
    nodes: BTreeMap<ActorId, NodeAttributes>,
    edges: Vec<InteractionEdge>,
}

impl InteractionGraph {
    /// Create an empty graph whose edges are stamped with `observation_year`.
    pub fn new(observation_year: i32) -> Self {
        Self {
            observation_year,
            next_key: 0,
            nodes: BTreeMap::new(),
            edges: Vec::new(),
        }
    }

    /// Create an empty graph observed in the current calendar year.
    pub fn for_current_year() -> Self {
        Self::new(Utc::now().year())
    }

    pub fn observation_year(&self) -> i32 {
        self.observation_year
    }

    /// Get the attributes of an actor, creating the node if needed.
    pub fn ensure_actor(&mut self, actor: &ActorId) -> &mut NodeAttributes {
        self.nodes.entry(actor.clone()).or_default()
    }

    /// Record that `actor` holds `role`.
    pub fn assign_role(&mut self, actor: &ActorId, role: Role) {
        self.ensure_actor(actor).grant(role);
    }

    /// Append an edge, creating both endpoints if needed.
    ///
    /// Returns the key assigned to the edge.
    pub fn add_edge(&mut self, draft: EdgeDraft) -> u64 {
        self.ensure_actor(&draft.source);
        self.ensure_actor(&draft.target);

        let key = self.next_key;
        self.next_key += 1;
        self.edges
            .push(InteractionEdge::from_draft(key, self.observation_year, draft));
        key
    }

    pub fn node(&self, actor: &ActorId) -> Option<&NodeAttributes> {
        self.nodes.get(actor)
    }

    pub fn contains_actor(&self, actor: &ActorId) -> bool {
        self.nodes.contains_key(actor)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&ActorId, &NodeAttributes)> {
        self.nodes.iter()
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = (&ActorId, &mut NodeAttributes)> {
        self.nodes.iter_mut()
    }

    pub fn edges(&self) -> &[InteractionEdge] {
        &self.edges
    }

    /// Outgoing edges of an actor, in insertion order.
    pub fn edges_from<'a>(&'a self, actor: &'a ActorId) -> impl Iterator<Item = &'a InteractionEdge> {
        self.edges.iter().filter(move |edge| &edge.source == actor)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Keep only edges matching `keep`. Returns the number removed.
    pub fn retain_edges<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&InteractionEdge) -> bool,
    {
        let before = self.edges.len();
        self.edges.retain(|edge| keep(edge));
        before - self.edges.len()
    }

    /// Remove an actor and every edge touching it.
    ///
    /// Returns the number of edges removed, or `None` if the actor was absent.
    pub fn remove_actor(&mut self, actor: &ActorId) -> Option<usize> {
        self.nodes.remove(actor)?;
        Some(self.retain_edges(|edge| !edge.touches(actor)))
    }

    /// Merge another graph into this one.
    ///
    /// Node attributes are merged, and the other graph's edges are appended
    /// in order with fresh keys from this graph's counter. Returns the number
    /// of edges absorbed.
    pub fn absorb(&mut self, other: InteractionGraph) -> usize {
        for (actor, attributes) in &other.nodes {
            self.ensure_actor(actor).merge_from(attributes);
        }

        let absorbed = other.edges.len();
        for edge in other.edges {
            let key = self.next_key;
            self.next_key += 1;
            self.edges.push(InteractionEdge { key, ..edge });
        }

        debug!(
            "Absorbed {} edges, graph now has {} nodes and {} edges",
            absorbed,
            self.nodes.len(),
            self.edges.len()
        );
        absorbed
    }

    /// Check that every edge endpoint is a node of the graph.
    ///
    /// Graphs built through `add_edge` always pass; deserialized graphs may not.
    pub fn validate(&self) -> Result<(), GraphError> {
        for edge in &self.edges {
            for actor in [&edge.source, &edge.target] {
                if !self.nodes.contains_key(actor) {
                    return Err(GraphError::DanglingEdge {
                        edge: edge.key,
                        actor: actor.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for InteractionGraph {
    fn default() -> Self {
        Self::for_current_year()
    }
}
