//! Listings-API-backed source.
//!
//! Adapts the pure `listings-client` crate to the [`ListingSource`] seam,
//! classifying transport failures into the variants the fetcher's retry
//! policy understands.

use async_trait::async_trait;

use listings_client::{ListingsClient, ListingsError};

use crate::traits::source::{ListingSource, MetadataCategory, SourceError};
use crate::types::listing::{RawListing, SearchPage};
use crate::types::query::QueryParams;

/// [`ListingSource`] implementation over the listings REST API.
#[derive(Debug, Clone)]
pub struct ApiListingSource {
    client: ListingsClient,
}

impl ApiListingSource {
    /// Wrap a configured client.
    pub fn new(client: ListingsClient) -> Self {
        Self { client }
    }
}

fn classify(error: ListingsError) -> SourceError {
    match error.status() {
        Some(status) => SourceError::from_status(status, error.to_string()),
        None => SourceError::Transport {
            message: error.to_string(),
        },
    }
}

fn client_category(category: MetadataCategory) -> listings_client::MetadataCategory {
    match category {
        MetadataCategory::Regions => listings_client::MetadataCategory::Regions,
        MetadataCategory::Districts => listings_client::MetadataCategory::Districts,
        MetadataCategory::Suburbs => listings_client::MetadataCategory::Suburbs,
        MetadataCategory::PropertyTypes => listings_client::MetadataCategory::PropertyTypes,
        MetadataCategory::SalesMethods => listings_client::MetadataCategory::SalesMethods,
    }
}

#[async_trait]
impl ListingSource for ApiListingSource {
    async fn search_page(
        &self,
        params: &QueryParams,
        page: u32,
    ) -> std::result::Result<SearchPage, SourceError> {
        let wire = self
            .client
            .search_residential(&params.to_pairs(), page)
            .await
            .map_err(classify)?;

        Ok(SearchPage {
            list: wire.list,
            total_count: wire.total_count,
            page_size: wire.page_size,
        })
    }

    async fn listing_detail(
        &self,
        listing_id: u64,
    ) -> std::result::Result<RawListing, SourceError> {
        self.client.listing(listing_id).await.map_err(classify)
    }

    async fn metadata(
        &self,
        category: MetadataCategory,
    ) -> std::result::Result<serde_json::Value, SourceError> {
        self.client
            .metadata(client_category(category))
            .await
            .map_err(classify)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let rate_limited = ListingsError::Api {
            status: 429,
            message: "slow down".into(),
        };
        assert_eq!(classify(rate_limited), SourceError::RateLimited);

        let server = ListingsError::Api {
            status: 502,
            message: "bad gateway".into(),
        };
        assert_eq!(classify(server), SourceError::Server { status: 502 });

        let not_found = ListingsError::Api {
            status: 404,
            message: "missing".into(),
        };
        assert!(matches!(
            classify(not_found),
            SourceError::Transport { .. }
        ));
    }
}
