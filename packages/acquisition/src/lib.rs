//! Resilient Listing-Acquisition Pipeline
//!
//! Acquires third-party real-estate listings matching a preference profile
//! and turns them into a clean, schema-conformant dataset. The pipeline
//! makes an unreliable, rate-limited, loosely-typed external dependency
//! behave deterministically:
//!
//! - free-text location input resolves against a hierarchical taxonomy,
//!   with a bounded confirm/correct loop when the resolution is ambiguous;
//! - listings are fetched page by page with typed backoff and bounded
//!   retry per page;
//! - each raw record is normalized into a fixed schema under function-call
//!   discipline, with default-filling and validate/retry semantics.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use acquisition::{
//!     AcquisitionPipeline, ApiListingSource, LocationTaxonomy, MetadataStore,
//!     OpenAiGenerator, SearchProfile, TargetSchema,
//! };
//! use listings_client::{ListingsClient, SignedSession};
//! use openai_client::OpenAIClient;
//!
//! let source = Arc::new(ApiListingSource::new(ListingsClient::sandbox(
//!     SignedSession::from_env().expect("listings credentials"),
//! )));
//! let generator = Arc::new(OpenAiGenerator::new(OpenAIClient::from_env()?, "gpt-4o"));
//!
//! let store = MetadataStore::new(source.clone(), "metadata.json");
//! let taxonomy = LocationTaxonomy::load(&store).await?;
//! let schema = Arc::new(TargetSchema::from_file("property_record.schema.json".as_ref())?);
//!
//! let pipeline = AcquisitionPipeline::new(generator, source, taxonomy, schema);
//! let run = pipeline.run(&SearchProfile::default()).await?;
//! println!("{} clean records", run.records.len());
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Seams (TextGenerator, ListingSource, collaborators)
//! - [`taxonomy`] - Location tree and metadata cache
//! - [`fuzzy`] - Three-tier name resolution
//! - [`params`] - Profile-to-parameter building with match hints
//! - [`confirm`] - Bounded confirmation loop
//! - [`fetch`] - Paginated retrieval with typed backoff
//! - [`normalize`] - Schema normalization with default-filling
//! - [`pipeline`] - End-to-end orchestration and artifacts
//! - [`testing`] - Mock implementations for testing

pub mod ai;
pub mod artifacts;
pub mod confirm;
pub mod error;
pub mod fetch;
pub mod fuzzy;
pub mod normalize;
pub mod params;
pub mod pipeline;
pub mod prompts;
pub mod sources;
pub mod taxonomy;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{
    AcquisitionError, BuildError, FetchError, MetadataError, NormalizeError, Result,
};
pub use traits::{
    generator::{ChatMessage, ChatRole, FunctionSpec, StructuredReply, TextGenerator},
    interview::PreferenceInterview,
    scorer::{ListingScorer, ScoredListing},
    source::{ListingSource, MetadataCategory, SourceError},
};
pub use types::{
    hints::{LocationLevel, MatchHint, MatchHints},
    listing::{listing_id, NormalizedRecord, RawListing, SearchPage},
    profile::SearchProfile,
    query::QueryParams,
};

// Re-export stage components
pub use confirm::{
    ConfirmOutcome, ConfirmStatus, ConfirmationLoop, MappingCorrections, MappingVerdict,
};
pub use fetch::{
    FetchLimits, FetchOutcome, FetchReport, PaginatedFetcher, RetryPolicy, Sleeper, TokioSleeper,
};
pub use fuzzy::SIMILARITY_THRESHOLD;
pub use normalize::{
    FailurePolicy, NormalizeOutcome, SchemaNormalizer, SkippedRecord, TargetSchema,
};
pub use params::{BuiltQuery, ParameterBuilder};
pub use pipeline::{AcquisitionPipeline, PipelineConfig, PipelineRun};
pub use taxonomy::{District, LocationTaxonomy, MetadataStore, Region, Suburb, VocabularyEntry};

// Re-export production adapters
pub use ai::OpenAiGenerator;
pub use sources::ApiListingSource;

// Re-export testing utilities
pub use testing::{InstantSleeper, MockGenerator, MockListingSource};
