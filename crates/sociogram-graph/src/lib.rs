//! Sociogram Graph - interaction multigraph for collaboration platforms.
//!
//! This crate provides the graph side of the interaction engine:
//!
//! - **Schema**: Actor identities, role flags, edge kinds
//! - **Graph**: In-memory directed multigraph with a graph-owned edge-key counter
//! - **Consolidation**: Attribute completion, self-loop removal, unresolved-actor
//!   pruning and multi-edge collapsing
//! - **Time series**: Projection of timestamped edges into per-actor or global series
//! - **Export**: Flat attribute maps for graph-exchange writers
//!
//! # Example
//!
//! ```ignore
//! use sociogram_graph::{ActorId, EdgeDraft, EdgeKind, InteractionGraph, Consolidator};
//! use chrono::Utc;
//!
//! let mut graph = InteractionGraph::for_current_year();
//! graph.add_edge(EdgeDraft::new(
//!     ActorId::known("bob"),
//!     ActorId::known("alice"),
//!     EdgeKind::DirectReply,
//!     Utc::now(),
//! ));
//!
//! Consolidator::default().consolidate(&mut graph)?;
//! ```

pub mod consolidate;
pub mod error;
pub mod export;
pub mod graph;
pub mod schema;
pub mod timeseries;

// Re-export commonly used types
pub use consolidate::{
    collapse, ConsolidationOptions, ConsolidationReport, Consolidator, WeightedEdge, WeightedGraph,
};
pub use error::GraphError;
pub use export::GraphExport;
pub use graph::InteractionGraph;
pub use schema::{ActorId, EdgeDraft, EdgeKind, InteractionEdge, NodeAttributes, Role};
pub use timeseries::{project, Focus, Projection, SeriesRow, Structure, TimeSeries};
