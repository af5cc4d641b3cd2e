//! End-to-end acquisition pipeline.
//!
//! Wires the stages together: profile → parameter build + confirmation →
//! paginated fetch → schema normalization, persisting the intermediate
//! artifacts as pretty-printed JSON files when an artifact directory is
//! configured. Each stage fully completes before the next begins.

use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use nonzero_ext::nonzero;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::artifacts;
use crate::confirm::{ConfirmStatus, ConfirmationLoop, DEFAULT_CONFIRM_ATTEMPTS};
use crate::error::Result;
use crate::fetch::{FetchLimits, FetchReport, PaginatedFetcher, RetryPolicy};
use crate::normalize::{
    FailurePolicy, NormalizeOutcome, SchemaNormalizer, SkippedRecord, TargetSchema,
    DEFAULT_RETRY_LIMIT,
};
use crate::params::ParameterBuilder;
use crate::taxonomy::LocationTaxonomy;
use crate::traits::generator::TextGenerator;
use crate::traits::source::ListingSource;
use crate::types::listing::NormalizedRecord;
use crate::types::profile::SearchProfile;
use crate::types::query::QueryParams;

/// File names of the persisted intermediate artifacts.
pub const SEARCH_PARAMS_ARTIFACT: &str = "search-params.json";
pub const RAW_LISTINGS_ARTIFACT: &str = "raw-listings.json";
pub const NORMALIZED_RECORDS_ARTIFACT: &str = "normalized-records.json";

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Confirmation rounds before degrading to best effort.
    pub confirm_attempts: u32,

    /// Page and record caps for the fetch stage.
    pub limits: FetchLimits,

    /// Whether to fetch full details per listing id.
    pub fetch_details: bool,

    /// Retry/backoff policy for page and detail fetches.
    pub retry: RetryPolicy,

    /// Detail-fetch pacing; `None` disables pacing.
    pub detail_rate: Option<NonZeroU32>,

    /// Per-record normalization attempt budget.
    pub normalize_retry_limit: u32,

    /// Batch behavior when a record exhausts its budget.
    pub failure_policy: FailurePolicy,

    /// Free-text location injected as the district when the profile names
    /// no location at all.
    pub fallback_location: Option<String>,

    /// Directory for intermediate artifacts; `None` writes nothing.
    pub artifact_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confirm_attempts: DEFAULT_CONFIRM_ATTEMPTS,
            limits: FetchLimits::none(),
            fetch_details: true,
            retry: RetryPolicy::default(),
            detail_rate: Some(nonzero!(2u32)),
            normalize_retry_limit: DEFAULT_RETRY_LIMIT,
            failure_policy: FailurePolicy::default(),
            fallback_location: None,
            artifact_dir: None,
        }
    }
}

/// Summary of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    /// The profile actually searched (after corrections and fallback).
    pub profile: SearchProfile,

    /// The submitted query parameters.
    pub params: QueryParams,

    /// How the confirmation loop terminated.
    pub confirmation: ConfirmStatus,

    /// What the fetch stage did.
    pub fetch_report: FetchReport,

    /// The clean record set.
    pub records: Vec<NormalizedRecord>,

    /// Records skipped under [`FailurePolicy::SkipRecord`].
    pub skipped: Vec<SkippedRecord>,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// The acquisition pipeline over injected seams.
pub struct AcquisitionPipeline {
    generator: Arc<dyn TextGenerator>,
    source: Arc<dyn ListingSource>,
    taxonomy: Arc<LocationTaxonomy>,
    schema: Arc<TargetSchema>,
    config: PipelineConfig,
    cancel: CancellationToken,
}

impl AcquisitionPipeline {
    /// Create a pipeline with the default configuration.
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        source: Arc<dyn ListingSource>,
        taxonomy: Arc<LocationTaxonomy>,
        schema: Arc<TargetSchema>,
    ) -> Self {
        Self {
            generator,
            source,
            taxonomy,
            schema,
            config: PipelineConfig::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach a cancellation token, honored between fetch iterations.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run the full pipeline for one profile.
    pub async fn run(&self, profile: &SearchProfile) -> Result<PipelineRun> {
        let started_at = Utc::now();

        let mut profile = profile.clone();
        if let Some(fallback) = &self.config.fallback_location {
            if profile.apply_fallback_location(fallback.clone()) {
                info!(fallback = %fallback, "no location in profile; using fallback district");
            }
        }
        if !profile.has_location() {
            warn!("profile names no location; searching without a location filter");
        }

        // Stage 1: build parameters and confirm the location mapping.
        let builder = ParameterBuilder::new(self.taxonomy.clone());
        let confirmed = ConfirmationLoop::new(self.generator.clone())
            .with_max_attempts(self.config.confirm_attempts)
            .confirm(&builder, &profile)
            .await?;
        info!(
            status = ?confirmed.status,
            attempts = confirmed.attempts,
            "location mapping confirmed"
        );
        self.write_artifact(SEARCH_PARAMS_ARTIFACT, &confirmed.query.params)?;

        // Stage 2: paginated fetch.
        let fetcher = PaginatedFetcher::new(self.source.clone())
            .with_policy(self.config.retry.clone())
            .with_detail_rate(self.config.detail_rate)
            .with_cancellation(self.cancel.clone());
        let fetched = if self.config.fetch_details {
            fetcher
                .fetch_all(&confirmed.query.params, &self.config.limits)
                .await?
        } else {
            fetcher
                .fetch_summaries(&confirmed.query.params, &self.config.limits)
                .await?
        };
        info!(
            listings = fetched.listings.len(),
            pages = fetched.report.pages_fetched,
            "raw listings fetched"
        );
        self.write_artifact(RAW_LISTINGS_ARTIFACT, &fetched.listings)?;

        // Stage 3: schema normalization.
        let normalizer = SchemaNormalizer::new(self.generator.clone(), self.schema.clone())
            .with_retry_limit(self.config.normalize_retry_limit)
            .with_failure_policy(self.config.failure_policy);
        let NormalizeOutcome { records, skipped } = normalizer.normalize(&fetched.listings).await?;
        info!(
            records = records.len(),
            skipped = skipped.len(),
            "records normalized"
        );
        self.write_artifact(NORMALIZED_RECORDS_ARTIFACT, &records)?;

        Ok(PipelineRun {
            profile: confirmed.profile,
            params: confirmed.query.params,
            confirmation: confirmed.status,
            fetch_report: fetched.report,
            records,
            skipped,
            started_at,
            finished_at: Utc::now(),
        })
    }

    fn write_artifact<T: serde::Serialize>(&self, name: &str, value: &T) -> Result<()> {
        if let Some(dir) = &self.config.artifact_dir {
            artifacts::write_json_atomic(&dir.join(name), value)?;
        }
        Ok(())
    }
}
