//! Adapter error types
//!
//! `AdapterError` aborts a whole source and is what the orchestrator counts
//! as a source failure. `ParseError` never leaves an adapter: the page that
//! caused it is skipped.

use super::http::FetchError;
use crate::guard::GuardError;
use crate::record::RawRecordError;
use std::time::Duration;
use thiserror::Error;

/// Source-level failures.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("source unavailable: {0}")]
    Unavailable(String),

    #[error("source rejected credentials: {0}")]
    Unauthorized(String),

    #[error("access policy violation: {0}")]
    PolicyViolation(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("adapter error: {0}")]
    Internal(String),
}

impl From<GuardError> for AdapterError {
    fn from(err: GuardError) -> Self {
        match err {
            GuardError::PolicyViolation(url) => Self::PolicyViolation(url),
            GuardError::InvalidUrl(url) => Self::Unavailable(format!("invalid URL '{}'", url)),
            GuardError::Closed => Self::Internal(err.to_string()),
        }
    }
}

impl From<FetchError> for AdapterError {
    fn from(err: FetchError) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Page-level failures: unexpected structure or malformed payload.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("page is empty")]
    EmptyPage,

    #[error("{items} items found but none matched '{selector}'")]
    MissingField { selector: String, items: usize },

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response does not contain a record list{0}")]
    NotARecordList(String),

    #[error(transparent)]
    Record(#[from] RawRecordError),
}
