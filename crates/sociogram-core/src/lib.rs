//! Sociogram Core - turns platform activity into interaction graphs.
//!
//! - **Builder**: Edge policies for discussions, file histories and directed actions
//! - **Pipeline**: Normalization, grouping, building and consolidation in one run
//! - **Config**: TOML analysis settings

pub mod builder;
pub mod config;
pub mod pipeline;

pub use builder::{BuildOptions, BuildStats, InteractionGraphBuilder};
pub use config::{AnalysisConfig, CONFIG_ENV};
pub use pipeline::{
    Analysis, AnalysisInput, AnalysisOutput, RawBatch, RunReport, SkippedGroup, COLLECTED_SCOPE,
};

// Re-export the crates downstream users need alongside the pipeline
pub use sociogram_graph;
pub use sociogram_ingest;
