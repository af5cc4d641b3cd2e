//! Pure residential-listings REST API client.
//!
//! A minimal client for the listings platform API. Supports paginated
//! residential search, per-id listing detail, and metadata lookups, all
//! authenticated with an opaque signed session.
//!
//! The client performs no retries and no backoff; transient-failure policy
//! belongs to the caller, which can classify failures via
//! [`ListingsError::status`].
//!
//! # Example
//!
//! ```rust,ignore
//! use listings_client::{ListingsClient, MetadataCategory, SignedSession};
//!
//! let session = SignedSession::new("consumer-key", "consumer-secret");
//! let client = ListingsClient::sandbox(session);
//!
//! let page = client
//!     .search_residential(&[("district".into(), "47".into())], 1)
//!     .await?;
//! println!("{} of {} listings", page.len(), page.total_count);
//!
//! let regions = client.metadata(MetadataCategory::Regions).await?;
//! ```

pub mod error;
pub mod session;
pub mod types;

pub use error::{ListingsError, Result};
pub use session::SignedSession;
pub use types::{MetadataCategory, SearchPage};

use tracing::debug;

const SANDBOX_BASE_URL: &str = "https://api.sandbox.listings.example/v1";
const PRODUCTION_BASE_URL: &str = "https://api.listings.example/v1";

/// Fixed path of the residential search endpoint.
const SEARCH_PATH: &str = "/Search/Property/Residential.json";

/// Pure listings API client.
#[derive(Debug, Clone)]
pub struct ListingsClient {
    client: reqwest::Client,
    base_url: String,
    session: SignedSession,
}

impl ListingsClient {
    /// Create a client against the sandbox environment.
    pub fn sandbox(session: SignedSession) -> Self {
        Self::with_base_url(session, SANDBOX_BASE_URL)
    }

    /// Create a client against the production environment.
    pub fn production(session: SignedSession) -> Self {
        Self::with_base_url(session, PRODUCTION_BASE_URL)
    }

    /// Create a client against a custom base URL (test servers, proxies).
    pub fn with_base_url(session: SignedSession, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            session,
        }
    }

    /// Use a custom `reqwest` client (timeouts, proxies).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch one page of residential search results.
    ///
    /// `params` are the query parameters excluding `page`, which is set from
    /// the `page` argument (1-based).
    pub async fn search_residential(
        &self,
        params: &[(String, String)],
        page: u32,
    ) -> Result<SearchPage> {
        let url = format!("{}{}", self.base_url, SEARCH_PATH);
        debug!(page = page, params = params.len(), "listings search request");

        let body = self
            .get_checked(
                self.client
                    .get(&url)
                    .query(params)
                    .query(&[("page", page.to_string())]),
            )
            .await?;

        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch the full detail object for one listing.
    pub async fn listing(&self, listing_id: u64) -> Result<serde_json::Value> {
        let url = format!("{}/Listings/{}.json", self.base_url, listing_id);
        debug!(listing_id = listing_id, "listing detail request");

        let body = self.get_checked(self.client.get(&url)).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch one metadata category (regions, property types, ...).
    pub async fn metadata(&self, category: MetadataCategory) -> Result<serde_json::Value> {
        let url = format!("{}/Metadata/{}.json", self.base_url, category.as_str());
        debug!(category = %category, "metadata request");

        let body = self.get_checked(self.client.get(&url)).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Send a signed GET request and return the body of a 2xx response.
    async fn get_checked(&self, request: reqwest::RequestBuilder) -> Result<String> {
        let response = request
            .header(
                reqwest::header::AUTHORIZATION,
                self.session.authorization_header(),
            )
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ListingsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.text().await?)
    }
}
