//! Preference-interview collaborator, by interface only.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::profile::SearchProfile;

/// A turn-based dialogue that ultimately emits a preference profile.
///
/// The interview itself lives outside this library; the pipeline only
/// consumes the profile it produces.
#[async_trait]
pub trait PreferenceInterview: Send + Sync {
    /// Run the interview to completion and return the elicited profile.
    async fn interview(&self) -> Result<SearchProfile>;
}
