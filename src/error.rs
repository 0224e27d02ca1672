//! Ingestion error types
//!
//! Unified error handling for the ingestion pipeline. Only the
//! variants here cross the orchestrator boundary; finer-grained
//! failures (cover extraction, outline resolution, page text) are
//! absorbed where they occur and degrade the output instead.

use thiserror::Error;

use crate::library::StoreError;

/// Unified ingestion error type
#[derive(Debug, Error)]
pub enum IngestError {
    /// File is larger than the configured limit, checked before parsing
    #[error("file exceeds the maximum size limit: {size} > {limit} bytes")]
    SizeLimitExceeded { size: u64, limit: u64 },

    /// No registered adapter claims the file
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// An adapter failed to parse the file
    #[error("parse error: {0}")]
    ParseError(String),

    /// The persistence collaborator failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

impl From<lopdf::Error> for IngestError {
    fn from(err: lopdf::Error) -> Self {
        IngestError::ParseError(err.to_string())
    }
}

impl From<zip::result::ZipError> for IngestError {
    fn from(err: zip::result::ZipError) -> Self {
        IngestError::ParseError(err.to_string())
    }
}

impl From<quick_xml::Error> for IngestError {
    fn from(err: quick_xml::Error) -> Self {
        IngestError::ParseError(err.to_string())
    }
}
