//! Typed errors for the acquisition library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so every stage exposes
//! a strongly-typed, composable failure mode. Transient transport conditions
//! are retried inside the stages with bounded backoff; only exhausted budgets
//! surface here.

use thiserror::Error;

use crate::traits::source::SourceError;

/// Errors that can occur across the acquisition pipeline.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// Parameter build failed (unmappable categorical filter)
    #[error("parameter build failed: {0}")]
    Build(#[from] BuildError),

    /// Paginated fetch failed
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Record normalization failed
    #[error("normalization failed: {0}")]
    Normalize(#[from] NormalizeError),

    /// Metadata/taxonomy loading failed
    #[error("metadata load failed: {0}")]
    Metadata(#[from] MetadataError),

    /// Text-generation capability failed
    #[error("text generation failed: {0}")]
    Generator(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Artifact or cache I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AcquisitionError {
    /// Wrap a provider error from a text-generation backend.
    pub fn generator(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Generator(Box::new(err))
    }

    /// Wrap a provider failure described only by a message.
    pub fn generator_msg(message: impl Into<String>) -> Self {
        Self::Generator(message.into().into())
    }
}

/// Errors raised while building query parameters from a profile.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError {
    /// A categorical filter value has no vocabulary match, even loosely.
    #[error("unmappable {field} value: {value:?}")]
    UnmappableValue { field: &'static str, value: String },
}

/// Errors raised by the paginated fetcher.
#[derive(Debug, Error)]
pub enum FetchError {
    /// A single page exhausted its retry budget, aborting the whole fetch.
    #[error("search page {page} failed after {attempts} attempts: {source}")]
    PageRetriesExhausted {
        page: u32,
        attempts: u32,
        source: SourceError,
    },

    /// The fetch was cancelled between iterations.
    #[error("fetch cancelled")]
    Cancelled,
}

/// Errors raised by the schema normalizer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NormalizeError {
    /// A record exhausted its attempt budget; `reason` is the last
    /// corrective message (parse or validation failure).
    #[error("record {index} failed normalization after {attempts} attempts: {reason}")]
    AttemptsExhausted {
        index: usize,
        attempts: u32,
        reason: String,
    },

    /// The target schema itself did not compile.
    #[error("target schema did not compile: {0}")]
    SchemaCompile(String),
}

/// Errors raised while loading metadata or the taxonomy cache.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The metadata endpoint failed.
    #[error("metadata fetch failed: {0}")]
    Source(#[from] SourceError),

    /// Cache file could not be read or replaced.
    #[error("metadata cache I/O: {0}")]
    Io(#[from] std::io::Error),

    /// Cache or payload was not valid JSON.
    #[error("metadata parse: {0}")]
    Parse(#[from] serde_json::Error),

    /// Payload parsed but did not have the expected shape.
    #[error("malformed {category} metadata: {reason}")]
    Malformed {
        category: &'static str,
        reason: String,
    },
}

/// Result type alias for acquisition operations.
pub type Result<T> = std::result::Result<T, AcquisitionError>;
