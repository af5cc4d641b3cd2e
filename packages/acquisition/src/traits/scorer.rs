//! Listing-scoring collaborator, by interface only.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::listing::NormalizedRecord;
use crate::types::profile::SearchProfile;

/// A listing scored against a profile.
#[derive(Debug, Clone)]
pub struct ScoredListing {
    /// Listing id, when the record carries one.
    pub listing_id: Option<u64>,

    /// Match score on a 0.0 to 1.0 scale.
    pub score: f32,

    /// Why the score was assigned.
    pub reasoning: String,
}

/// Scores normalized records against a preference profile.
///
/// Ranking lives outside this library; it is a single request/response with
/// no retry complexity beyond what the normalizer already demonstrates.
#[async_trait]
pub trait ListingScorer: Send + Sync {
    /// Score every record, highest first.
    async fn score(
        &self,
        profile: &SearchProfile,
        records: &[NormalizedRecord],
    ) -> Result<Vec<ScoredListing>>;
}
