//! Post-processing for finished interaction graphs.
//!
//! Consolidation runs, in order:
//! 1. attribute completion (uniform node schema)
//! 2. optional self-loop removal
//! 3. pruning of the unresolved actor
//!
//! Collapsing parallel edges into a weighted simple graph is a separate,
//! optional step (`collapse`), since it changes the graph type.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::GraphError;
use crate::graph::InteractionGraph;
use crate::schema::{actor_map, ActorId, NodeAttributes, Role};

/// Options for `Consolidator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidationOptions {
    /// Keep self-loops (`true`) or remove them (`false`).
    pub self_loops: bool,
}

impl Default for ConsolidationOptions {
    fn default() -> Self {
        Self { self_loops: true }
    }
}

/// What a consolidation pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidationReport {
    /// Nodes that were missing at least one attribute
    pub nodes_completed: usize,
    pub self_loops_removed: usize,
    /// Whether the unresolved actor was present and removed
    pub unresolved_pruned: bool,
    /// Edges removed together with the unresolved actor
    pub unresolved_edges_removed: usize,
}

pub struct Consolidator {
    options: ConsolidationOptions,
}

impl Consolidator {
    pub fn new(options: ConsolidationOptions) -> Self {
        Self { options }
    }

    /// Run completion, self-loop removal and unresolved pruning in order.
    ///
    /// Fails if the graph references actors it does not contain.
    pub fn consolidate(&self, graph: &mut InteractionGraph) -> Result<ConsolidationReport, GraphError> {
        graph.validate()?;

        let nodes_completed = complete_attributes(graph);
        let self_loops_removed = if self.options.self_loops {
            0
        } else {
            remove_self_loops(graph)
        };
        let pruned = prune_unresolved(graph);

        let report = ConsolidationReport {
            nodes_completed,
            self_loops_removed,
            unresolved_pruned: pruned.is_some(),
            unresolved_edges_removed: pruned.unwrap_or(0),
        };

        info!(
            "Consolidated graph: {} nodes, {} edges ({} self-loops removed, {} unresolved edges pruned)",
            graph.node_count(),
            graph.edge_count(),
            report.self_loops_removed,
            report.unresolved_edges_removed
        );

        Ok(report)
    }
}

impl Default for Consolidator {
    fn default() -> Self {
        Self::new(ConsolidationOptions::default())
    }
}

/// Give every node a label and an explicit value for every role.
///
/// Returns the number of nodes that needed at least one fill-in.
pub fn complete_attributes(graph: &mut InteractionGraph) -> usize {
    let mut completed = 0;
    for (actor, attributes) in graph.nodes_mut() {
        if attributes.is_complete() {
            continue;
        }
        if attributes.label.is_none() {
            attributes.label = Some(actor.to_string());
        }
        for role in Role::ALL {
            attributes.roles.entry(role).or_insert(false);
        }
        completed += 1;
    }
    completed
}

/// Remove every edge whose source equals its target. Idempotent.
pub fn remove_self_loops(graph: &mut InteractionGraph) -> usize {
    let removed = graph.retain_edges(|edge| !edge.is_self_loop());
    if removed > 0 {
        debug!("Removed {} self-loops", removed);
    }
    removed
}

/// Remove the unresolved actor and every edge touching it.
///
/// Returns the number of edges removed, or `None` if the actor was absent.
pub fn prune_unresolved(graph: &mut InteractionGraph) -> Option<usize> {
    let removed = graph.remove_actor(&ActorId::Unresolved)?;
    debug!("Pruned unresolved actor with {} edges", removed);
    Some(removed)
}

/// Collapse parallel edges into a simple weighted directed graph.
///
/// Each ordered pair of actors becomes one edge whose weight is the number of
/// parallel edges between them. Node attributes are carried over unchanged.
pub fn collapse(graph: &InteractionGraph) -> WeightedGraph {
    let nodes: BTreeMap<ActorId, NodeAttributes> = graph
        .nodes()
        .map(|(actor, attributes)| (actor.clone(), attributes.clone()))
        .collect();

    let mut weights: BTreeMap<(ActorId, ActorId), u64> = BTreeMap::new();
    for edge in graph.edges() {
        *weights
            .entry((edge.source.clone(), edge.target.clone()))
            .or_insert(0) += 1;
    }

    let edges = weights
        .into_iter()
        .map(|((source, target), weight)| WeightedEdge {
            source,
            target,
            weight,
        })
        .collect();

    WeightedGraph { nodes, edges }
}

/// A simple directed graph with one weighted edge per ordered actor pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedGraph {
    #[serde(with = "actor_map")]
    pub nodes: BTreeMap<ActorId, NodeAttributes>,
    pub edges: Vec<WeightedEdge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedEdge {
    pub source: ActorId,
    pub target: ActorId,
    pub weight: u64,
}

impl WeightedGraph {
    pub fn weight(&self, source: &ActorId, target: &ActorId) -> Option<u64> {
        self.edges
            .iter()
            .find(|edge| &edge.source == source && &edge.target == target)
            .map(|edge| edge.weight)
    }

    /// Sum of all edge weights; equals the edge count of the source multigraph.
    pub fn total_weight(&self) -> u64 {
        self.edges.iter().map(|edge| edge.weight).sum()
    }
}
