//! Collectors that read data sources on disk and emit normalized events.

#[cfg(feature = "local-git")]
pub mod local_git;

#[cfg(feature = "local-git")]
pub use local_git::{ExtractionResult, LocalGitConfig, LocalGitExtractor};
