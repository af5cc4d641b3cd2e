//! Paginated listing retrieval with bounded retry and typed backoff.
//!
//! Pages are fetched strictly in order because termination depends on the
//! running total reported by earlier pages. Each page (and each detail
//! fetch) gets its own retry budget; waits between attempts are typed by
//! failure class and recorded in the report.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::traits::source::{ListingSource, SourceError};
use crate::types::listing::{listing_id, RawListing, SearchPage};
use crate::types::query::QueryParams;

type DirectRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Waits the fetcher performs between retry attempts.
///
/// `budget` is the number of failed attempts tolerated per page or per
/// detail item; the final failure surfaces without a wait.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Failed attempts tolerated per page or item.
    pub budget: u32,

    /// Fixed wait after a rate-limit response.
    pub rate_limit_wait: Duration,

    /// Base wait after a server error, scaled linearly by attempt number.
    pub server_error_base: Duration,

    /// Fixed short wait after any other failure.
    pub error_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            budget: 3,
            rate_limit_wait: Duration::from_secs(60),
            server_error_base: Duration::from_secs(5),
            error_wait: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Wait before the retry following the `attempt`-th failure (1-based).
    pub fn wait_for(&self, error: &SourceError, attempt: u32) -> Duration {
        match error {
            SourceError::RateLimited => self.rate_limit_wait,
            SourceError::Server { .. } => self.server_error_base * attempt,
            SourceError::Transport { .. } => self.error_wait,
        }
    }
}

/// Caps on how much a fetch may collect.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchLimits {
    /// Stop after this many pages.
    pub max_pages: Option<u32>,

    /// Stop once this many records are collected; overflow is truncated.
    pub max_records: Option<usize>,
}

impl FetchLimits {
    /// No caps: fetch until the server-reported total.
    pub fn none() -> Self {
        Self::default()
    }

    /// Cap the number of pages.
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Cap the number of records.
    pub fn with_max_records(mut self, max_records: usize) -> Self {
        self.max_records = Some(max_records);
        self
    }
}

/// What a fetch did, beyond the listings themselves.
#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    /// Pages successfully fetched.
    pub pages_fetched: u32,

    /// Every backoff wait performed, in order.
    pub backoff_waits: Vec<Duration>,

    /// Whether `max_records` truncated the overflow.
    pub truncated: bool,

    /// Listing ids whose detail fetch exhausted its budget and was skipped.
    pub skipped_details: Vec<u64>,
}

/// Listings plus the report of how they were obtained.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub listings: Vec<RawListing>,
    pub report: FetchReport,
}

/// Performs the waits between retry attempts.
///
/// A seam so backoff behavior is assertable in tests without waiting; the
/// production implementation is [`TokioSleeper`].
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, wait: Duration);
}

/// Sleeper backed by the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, wait: Duration) {
        tokio::time::sleep(wait).await;
    }
}

/// Paginated fetcher over a listing source.
pub struct PaginatedFetcher {
    source: Arc<dyn ListingSource>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    detail_rate: Option<NonZeroU32>,
    cancel: CancellationToken,
}

impl PaginatedFetcher {
    /// Create a fetcher with the default policy and a 2 req/s detail pace.
    pub fn new(source: Arc<dyn ListingSource>) -> Self {
        Self {
            source,
            policy: RetryPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
            detail_rate: Some(nonzero!(2u32)),
            cancel: CancellationToken::new(),
        }
    }

    /// Set the retry policy.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the sleeper used for backoff waits.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Set the detail-fetch pacing rate; `None` disables pacing.
    pub fn with_detail_rate(mut self, detail_rate: Option<NonZeroU32>) -> Self {
        self.detail_rate = detail_rate;
        self
    }

    /// Attach a cancellation token, checked between page and detail fetches.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Fetch listing summaries page by page.
    ///
    /// Termination is evaluated after each successful page, in priority
    /// order: empty page; `max_pages`; `max_records` (with truncation);
    /// cumulative count at or past the server-reported total.
    pub async fn fetch_summaries(
        &self,
        params: &QueryParams,
        limits: &FetchLimits,
    ) -> Result<FetchOutcome, FetchError> {
        let mut report = FetchReport::default();
        let mut listings: Vec<RawListing> = Vec::new();
        let mut page: u32 = 1;

        loop {
            if self.cancel.is_cancelled() {
                return Err(FetchError::Cancelled);
            }

            let search_page = self.page_with_retry(params, page, &mut report).await?;
            report.pages_fetched = page;

            let count = search_page.len();
            info!(
                page = page,
                count = count,
                total = search_page.total_count,
                "search page fetched"
            );
            let total_count = search_page.total_count;
            listings.extend(search_page.list);

            if count == 0 {
                debug!(page = page, "empty page; ending search");
                break;
            }
            if limits.max_pages.map_or(false, |max| page >= max) {
                info!(max_pages = limits.max_pages, "page cap reached; ending search");
                break;
            }
            if limits.max_records.map_or(false, |max| listings.len() >= max) {
                info!(max_records = limits.max_records, "record cap reached; ending search");
                break;
            }
            if listings.len() as u64 >= total_count {
                info!(total = total_count, pages = page, "all reported listings fetched");
                break;
            }

            page += 1;
        }

        if let Some(max) = limits.max_records {
            if listings.len() > max {
                listings.truncate(max);
                report.truncated = true;
            }
        }

        Ok(FetchOutcome { listings, report })
    }

    /// Fetch summaries, then the full detail object per listing id.
    ///
    /// A detail item exhausting its budget is logged and skipped, never
    /// aborting the batch. A fixed pace between detail requests respects
    /// the remote service's rate limit.
    pub async fn fetch_all(
        &self,
        params: &QueryParams,
        limits: &FetchLimits,
    ) -> Result<FetchOutcome, FetchError> {
        let FetchOutcome {
            listings: summaries,
            mut report,
        } = self.fetch_summaries(params, limits).await?;

        let ids: Vec<u64> = summaries.iter().filter_map(listing_id).collect();
        info!(ids = ids.len(), summaries = summaries.len(), "fetching listing details");

        let limiter: Option<DirectRateLimiter> = self
            .detail_rate
            .map(|rate| RateLimiter::direct(Quota::per_second(rate)));

        let total = ids.len();
        let mut details: Vec<RawListing> = Vec::with_capacity(total);

        for (index, id) in ids.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(FetchError::Cancelled);
            }
            if let Some(limiter) = &limiter {
                limiter.until_ready().await;
            }

            match self.detail_with_retry(id, &mut report).await? {
                Some(detail) => {
                    info!(
                        index = index + 1,
                        total = total,
                        listing_id = id,
                        "listing detail fetched"
                    );
                    details.push(detail);
                }
                None => report.skipped_details.push(id),
            }
        }

        Ok(FetchOutcome {
            listings: details,
            report,
        })
    }

    /// Fetch one page, retrying within the policy's budget.
    async fn page_with_retry(
        &self,
        params: &QueryParams,
        page: u32,
        report: &mut FetchReport,
    ) -> Result<SearchPage, FetchError> {
        let mut failures: u32 = 0;

        loop {
            if self.cancel.is_cancelled() {
                return Err(FetchError::Cancelled);
            }

            match self.source.search_page(params, page).await {
                Ok(search_page) => return Ok(search_page),
                Err(error) => {
                    failures += 1;
                    if failures >= self.policy.budget {
                        return Err(FetchError::PageRetriesExhausted {
                            page,
                            attempts: failures,
                            source: error,
                        });
                    }

                    let wait = self.policy.wait_for(&error, failures);
                    warn!(
                        page = page,
                        attempt = failures,
                        error = %error,
                        wait_secs = wait.as_secs(),
                        "search page fetch failed; backing off"
                    );
                    report.backoff_waits.push(wait);
                    self.sleeper.sleep(wait).await;
                }
            }
        }
    }

    /// Fetch one detail, retrying within the budget; `None` means skipped.
    async fn detail_with_retry(
        &self,
        id: u64,
        report: &mut FetchReport,
    ) -> Result<Option<RawListing>, FetchError> {
        let mut failures: u32 = 0;

        loop {
            if self.cancel.is_cancelled() {
                return Err(FetchError::Cancelled);
            }

            match self.source.listing_detail(id).await {
                Ok(detail) => return Ok(Some(detail)),
                Err(error) => {
                    failures += 1;
                    if failures >= self.policy.budget {
                        warn!(
                            listing_id = id,
                            attempts = failures,
                            error = %error,
                            "listing detail failed; skipping"
                        );
                        return Ok(None);
                    }

                    let wait = self.policy.wait_for(&error, failures);
                    warn!(
                        listing_id = id,
                        attempt = failures,
                        error = %error,
                        wait_secs = wait.as_secs(),
                        "listing detail fetch failed; backing off"
                    );
                    report.backoff_waits.push(wait);
                    self.sleeper.sleep(wait).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InstantSleeper, MockListingSource};

    fn summaries(ids: &[u64]) -> Vec<RawListing> {
        ids.iter()
            .map(|id| serde_json::json!({"ListingId": id}))
            .collect()
    }

    fn page(ids: &[u64], total_count: u64, page_size: u32) -> SearchPage {
        SearchPage {
            list: summaries(ids),
            total_count,
            page_size,
        }
    }

    fn fetcher(source: MockListingSource) -> (PaginatedFetcher, InstantSleeper) {
        let sleeper = InstantSleeper::default();
        let fetcher = PaginatedFetcher::new(Arc::new(source))
            .with_sleeper(Arc::new(sleeper.clone()))
            .with_detail_rate(None);
        (fetcher, sleeper)
    }

    #[tokio::test]
    async fn test_three_pages_aggregate_to_reported_total() {
        // 45 listings at page size 20: pages of 20, 20, and 5.
        let source = MockListingSource::new()
            .with_page(page(&(1..=20).collect::<Vec<_>>(), 45, 20))
            .with_page(page(&(21..=40).collect::<Vec<_>>(), 45, 20))
            .with_page(page(&(41..=45).collect::<Vec<_>>(), 45, 20));
        let (fetcher, _) = fetcher(source);

        let outcome = fetcher
            .fetch_summaries(&QueryParams::new(), &FetchLimits::none())
            .await
            .unwrap();

        assert_eq!(outcome.listings.len(), 45);
        assert_eq!(outcome.report.pages_fetched, 3);
        assert!(!outcome.report.truncated);
    }

    #[tokio::test]
    async fn test_empty_page_terminates() {
        let source = MockListingSource::new()
            .with_page(page(&[1, 2], 100, 2))
            .with_page(page(&[], 100, 2));
        let (fetcher, _) = fetcher(source);

        let outcome = fetcher
            .fetch_summaries(&QueryParams::new(), &FetchLimits::none())
            .await
            .unwrap();

        assert_eq!(outcome.listings.len(), 2);
        assert_eq!(outcome.report.pages_fetched, 2);
    }

    #[tokio::test]
    async fn test_max_pages_beats_server_total() {
        let source = MockListingSource::new()
            .with_page(page(&[1, 2], 1000, 2))
            .with_page(page(&[3, 4], 1000, 2));
        let (fetcher, _) = fetcher(source);

        let outcome = fetcher
            .fetch_summaries(
                &QueryParams::new(),
                &FetchLimits::none().with_max_pages(2),
            )
            .await
            .unwrap();

        assert_eq!(outcome.listings.len(), 4);
        assert_eq!(outcome.report.pages_fetched, 2);
    }

    #[tokio::test]
    async fn test_max_records_truncates_overflow() {
        let source = MockListingSource::new().with_page(page(&[1, 2, 3, 4, 5], 50, 5));
        let (fetcher, _) = fetcher(source);

        let outcome = fetcher
            .fetch_summaries(
                &QueryParams::new(),
                &FetchLimits::none().with_max_records(3),
            )
            .await
            .unwrap();

        assert_eq!(outcome.listings.len(), 3);
        assert!(outcome.report.truncated);
    }

    #[tokio::test]
    async fn test_rate_limited_twice_then_success() {
        let source = MockListingSource::new()
            .with_page_error(SourceError::RateLimited)
            .with_page_error(SourceError::RateLimited)
            .with_page(page(&[7], 1, 20));
        let (fetcher, sleeper) = fetcher(source);

        let outcome = fetcher
            .fetch_summaries(&QueryParams::new(), &FetchLimits::none())
            .await
            .unwrap();

        assert_eq!(outcome.listings.len(), 1);
        assert_eq!(
            outcome.report.backoff_waits,
            vec![Duration::from_secs(60), Duration::from_secs(60)]
        );
        assert_eq!(
            sleeper.waits(),
            vec![Duration::from_secs(60), Duration::from_secs(60)]
        );
    }

    #[tokio::test]
    async fn test_server_errors_back_off_linearly() {
        let source = MockListingSource::new()
            .with_page_error(SourceError::Server { status: 503 })
            .with_page_error(SourceError::Server { status: 503 })
            .with_page(page(&[7], 1, 20));
        let (fetcher, sleeper) = fetcher(source);

        fetcher
            .fetch_summaries(&QueryParams::new(), &FetchLimits::none())
            .await
            .unwrap();

        assert_eq!(
            sleeper.waits(),
            vec![Duration::from_secs(5), Duration::from_secs(10)]
        );
    }

    #[tokio::test]
    async fn test_budget_exhaustion_aborts_fetch() {
        let source = MockListingSource::new()
            .with_page_error(SourceError::Server { status: 500 })
            .with_page_error(SourceError::Server { status: 500 })
            .with_page_error(SourceError::Server { status: 500 });
        let (fetcher, sleeper) = fetcher(source);

        let err = fetcher
            .fetch_summaries(&QueryParams::new(), &FetchLimits::none())
            .await
            .unwrap_err();

        match err {
            FetchError::PageRetriesExhausted { page, attempts, source } => {
                assert_eq!(page, 1);
                assert_eq!(attempts, 3);
                assert_eq!(source, SourceError::Server { status: 500 });
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // The final failure surfaces without a wait.
        assert_eq!(sleeper.waits().len(), 2);
    }

    #[tokio::test]
    async fn test_detail_phase_skips_failed_items() {
        let source = MockListingSource::new()
            .with_page(page(&[1, 2, 3], 3, 20))
            .with_detail(1, serde_json::json!({"ListingId": 1, "Title": "A"}))
            .with_detail_error(2, SourceError::Server { status: 500 })
            .with_detail_error(2, SourceError::Server { status: 500 })
            .with_detail_error(2, SourceError::Server { status: 500 })
            .with_detail(3, serde_json::json!({"ListingId": 3, "Title": "C"}));
        let (fetcher, _) = fetcher(source);

        let outcome = fetcher
            .fetch_all(&QueryParams::new(), &FetchLimits::none())
            .await
            .unwrap();

        assert_eq!(outcome.listings.len(), 2);
        assert_eq!(outcome.report.skipped_details, vec![2]);
    }

    #[tokio::test]
    async fn test_detail_retry_recovers() {
        let source = MockListingSource::new()
            .with_page(page(&[9], 1, 20))
            .with_detail_error(9, SourceError::RateLimited)
            .with_detail(9, serde_json::json!({"ListingId": 9, "Title": "B"}));
        let (fetcher, sleeper) = fetcher(source);

        let outcome = fetcher
            .fetch_all(&QueryParams::new(), &FetchLimits::none())
            .await
            .unwrap();

        assert_eq!(outcome.listings.len(), 1);
        assert!(outcome.report.skipped_details.is_empty());
        assert_eq!(sleeper.waits(), vec![Duration::from_secs(60)]);
    }

    #[tokio::test]
    async fn test_cancellation_between_pages() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let source = MockListingSource::new().with_page(page(&[1], 1, 20));
        let fetcher = PaginatedFetcher::new(Arc::new(source))
            .with_detail_rate(None)
            .with_cancellation(cancel);

        let err = fetcher
            .fetch_summaries(&QueryParams::new(), &FetchLimits::none())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Cancelled));
    }

    #[tokio::test]
    async fn test_summaries_without_ids_are_skipped_in_detail_phase() {
        let source = MockListingSource::new()
            .with_page(SearchPage {
                list: vec![
                    serde_json::json!({"ListingId": 5}),
                    serde_json::json!({"Title": "no id"}),
                ],
                total_count: 2,
                page_size: 20,
            })
            .with_detail(5, serde_json::json!({"ListingId": 5}));
        let (fetcher, _) = fetcher(source);

        let outcome = fetcher
            .fetch_all(&QueryParams::new(), &FetchLimits::none())
            .await
            .unwrap();

        assert_eq!(outcome.listings.len(), 1);
    }
}
