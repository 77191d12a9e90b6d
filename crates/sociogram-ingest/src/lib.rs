//! Sociogram Ingest - from raw platform payloads to ordered event groups.
//!
//! - **Events**: The uniform `Event` record and its correlation key
//! - **Normalization**: One normalizer per source platform
//! - **Chronology**: Grouping by correlation key and stable time ordering
//! - **Mentions**: Username extraction from markup and plain-text bodies
//! - **Identity**: Linking version-control authors to platform logins
//! - **Extractors**: On-disk collectors (local git, behind `local-git`)

pub mod chronology;
pub mod error;
pub mod event;
pub mod extractors;
pub mod identity;
pub mod mentions;
pub mod normalize;

pub use chronology::{group_by_correlation, order, OrderedGroup};
pub use error::IngestError;
pub use event::{AuthorProfile, BodyFormat, CorrelationKey, Event, EventKind};
pub use identity::{IdentityLink, IdentityLinker, MatchType};
pub use mentions::extract_mentions;
pub use normalize::{parse_timestamp, Platform};

// Re-export graph types for convenience
pub use sociogram_graph::{ActorId, EdgeDraft, EdgeKind, InteractionGraph, Role};
