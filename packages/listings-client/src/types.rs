//! Listings API request and response types.

use serde::{Deserialize, Serialize};

/// One page of search results.
///
/// `list` holds the raw listing summaries exactly as the API returned them;
/// nothing in this crate inspects their contents beyond deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchPage {
    /// Listing summaries on this page.
    #[serde(rename = "List", default)]
    pub list: Vec<serde_json::Value>,

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

/// Metadata categories exposed by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetadataCategory {
    Regions,
    Districts,
    Suburbs,
    PropertyTypes,
    SalesMethods,
}

impl MetadataCategory {
    /// Path segment used by the metadata endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regions => "Regions",
            Self::Districts => "Districts",
            Self::Suburbs => "Suburbs",
            Self::PropertyTypes => "PropertyTypes",
            Self::SalesMethods => "SalesMethods",
        }
    }

    /// All categories, in cache order.
    pub fn all() -> [MetadataCategory; 5] {
        [
            Self::Regions,
            Self::Districts,
            Self::Suburbs,
            Self::PropertyTypes,
            Self::SalesMethods,
        ]
    }
}

impl std::fmt::Display for MetadataCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_page_deserializes_wire_names() {
        let json = serde_json::json!({
            "TotalCount": 45,
            "PageSize": 20,
            "List": [{"ListingId": 1}, {"ListingId": 2}],
        });

        let page: SearchPage = serde_json::from_value(json).unwrap();
        assert_eq!(page.total_count, 45);
        assert_eq!(page.page_size, 20);
        assert_eq!(page.len(), 2);
    }

    #[test]
    fn test_search_page_tolerates_missing_fields() {
        let page: SearchPage = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(page.is_empty());
        assert_eq!(page.total_count, 0);
    }

    #[test]
    fn test_metadata_category_paths() {
        assert_eq!(MetadataCategory::Regions.as_str(), "Regions");
        assert_eq!(MetadataCategory::SalesMethods.as_str(), "SalesMethods");
    }
}
