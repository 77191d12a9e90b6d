use thiserror::Error;

use crate::event::CorrelationKey;

#[derive(Debug, Error, PartialEq)]
pub enum IngestError {
    #[error("malformed payload: field '{field}' {reason}")]
    MalformedPayload { field: &'static str, reason: String },

    #[error("correlation group {key} has no events")]
    EmptyGroup { key: CorrelationKey },

    #[error("event '{event}' belongs to {found}, not {expected}")]
    MixedGroup {
        event: String,
        expected: CorrelationKey,
        found: CorrelationKey,
    },
}

impl IngestError {
    pub(crate) fn missing(field: &'static str) -> Self {
        IngestError::MalformedPayload {
            field,
            reason: "is missing".to_string(),
        }
    }

    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        IngestError::MalformedPayload {
            field,
            reason: reason.into(),
        }
    }
}
