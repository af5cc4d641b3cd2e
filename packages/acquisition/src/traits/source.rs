//! Listings-source trait.
//!
//! Abstracts the external listings API behind the three calls the pipeline
//! needs: paginated search, per-id detail, and metadata categories. Errors
//! are pre-classified so the fetcher's retry policy needs no HTTP knowledge.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::listing::{RawListing, SearchPage};
use crate::types::query::QueryParams;

/// Metadata categories the taxonomy is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataCategory {
    Regions,
    Districts,
    Suburbs,
    PropertyTypes,
    SalesMethods,
}

impl MetadataCategory {
    /// Key used in the cache file and the endpoint path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regions => "Regions",
            Self::Districts => "Districts",
            Self::Suburbs => "Suburbs",
            Self::PropertyTypes => "PropertyTypes",
            Self::SalesMethods => "SalesMethods",
        }
    }
}

impl std::fmt::Display for MetadataCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified failure from the listings source.
///
/// The variants map one-to-one onto the fetcher's backoff tiers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// HTTP 429: the remote service throttled us.
    #[error("rate limited (HTTP 429)")]
    RateLimited,

    /// HTTP 5xx: the remote service failed.
    #[error("server error (HTTP {status})")]
    Server { status: u16 },

    /// Anything else: connection failure, bad payload, unexpected status.
    #[error("transport failure: {message}")]
    Transport { message: String },
}

impl SourceError {
    /// Classify an HTTP status plus message into a source error.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            429 => Self::RateLimited,
            s if s >= 500 => Self::Server { status: s },
            _ => Self::Transport {
                message: message.into(),
            },
        }
    }
}

/// External listings API.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch one page (1-based) of search results for the given parameters.
    async fn search_page(
        &self,
        params: &QueryParams,
        page: u32,
    ) -> std::result::Result<SearchPage, SourceError>;

    /// Fetch the full detail object for one listing.
    async fn listing_detail(
        &self,
        listing_id: u64,
    ) -> std::result::Result<RawListing, SourceError>;

    /// Fetch one metadata category's raw payload.
    async fn metadata(
        &self,
        category: MetadataCategory,
    ) -> std::result::Result<serde_json::Value, SourceError>;
}
