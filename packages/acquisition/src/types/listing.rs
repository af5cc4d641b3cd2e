//! Listing payload types.

use serde::{Deserialize, Serialize};

/// A raw listing exactly as the external API returned it.
///
/// Opaque to the pipeline: no invariants are enforced until normalization.
pub type RawListing = serde_json::Value;

/// A normalized record conforming to the target schema after
/// default-filling. Either fully valid or the record's processing failed;
/// never partial.
pub type NormalizedRecord = serde_json::Map<String, serde_json::Value>;

/// One page of search results from the listings API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    /// Listing summaries on this page.
    #[serde(rename = "List", default)]
    pub list: Vec<RawListing>,

    /// Total matching listings across all pages, as reported by the server.
    #[serde(rename = "TotalCount", default)]
    pub total_count: u64,

    /// Server-side page size.
    #[serde(rename = "PageSize", default)]
    pub page_size: u32,
}

impl SearchPage {
    /// Number of items on this page.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// True when the page carries no items.
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

/// Extract the listing id from a raw summary, if present.
pub fn listing_id(listing: &RawListing) -> Option<u64> {
    listing.get("ListingId").and_then(serde_json::Value::as_u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_id_extraction() {
        let listing = serde_json::json!({"ListingId": 98765, "Title": "Sunny villa"});
        assert_eq!(listing_id(&listing), Some(98765));

        let missing = serde_json::json!({"Title": "No id"});
        assert_eq!(listing_id(&missing), None);

        let wrong_type = serde_json::json!({"ListingId": "98765"});
        assert_eq!(listing_id(&wrong_type), None);
    }
}
