//! Service-level error types
//!
//! Every core operation reports one of five kinds. The boundary layer maps
//! the kind to a transport status; the core itself has no notion of HTTP.

use serde::Serialize;
use thiserror::Error;

use crate::document::DocumentError;

/// Machine-readable error category for the boundary layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Missing, malformed or out-of-range parameter. Detected before any
    /// file I/O begins.
    InvalidArgument,
    /// Input file or database directory does not exist.
    NotFound,
    /// Container bytes violate the MIDI document invariants.
    ParseFailure,
    /// The output allocator exhausted its collision-retry budget.
    OutputConflict,
    /// Unexpected failure, e.g. an I/O error mid-write.
    Internal,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("parse failure: {0}")]
    ParseFailure(DocumentError),
    #[error("output conflict: {0}")]
    OutputConflict(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::ParseFailure(_) => ErrorKind::ParseFailure,
            ServiceError::OutputConflict(_) => ErrorKind::OutputConflict,
            ServiceError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<DocumentError> for ServiceError {
    fn from(err: DocumentError) -> Self {
        match err {
            // A serialization failure is not the input's fault.
            DocumentError::Write(msg) => ServiceError::Internal(msg),
            other => ServiceError::ParseFailure(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
