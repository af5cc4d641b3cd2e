//! Testing utilities including mock implementations.
//!
//! Useful for testing applications that drive the acquisition pipeline
//! without a real text-generation provider or listings API. All mocks are
//! cheaply cloneable handles over shared interior state, so a test can keep
//! a clone for assertions after handing one to the pipeline.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AcquisitionError, Result};
use crate::fetch::Sleeper;
use crate::normalize::TargetSchema;
use crate::taxonomy::LocationTaxonomy;
use crate::traits::generator::{ChatMessage, FunctionSpec, StructuredReply, TextGenerator};
use crate::traits::source::{ListingSource, MetadataCategory, SourceError};
use crate::types::listing::{RawListing, SearchPage};
use crate::types::query::QueryParams;

// =============================================================================
// MockGenerator
// =============================================================================

/// Record of a call made to the mock generator.
#[derive(Debug, Clone)]
pub enum GeneratorCall {
    Generate { messages: usize },
    GenerateStructured { function: String, messages: usize },
}

/// A mock text-generation capability with scripted replies.
///
/// Replies are consumed in order; an exhausted script fails the call, which
/// keeps a test honest about how many attempts a stage really made.
#[derive(Default, Clone)]
pub struct MockGenerator {
    text_replies: Arc<Mutex<VecDeque<String>>>,
    structured_replies: Arc<Mutex<VecDeque<std::result::Result<StructuredReply, String>>>>,
    calls: Arc<Mutex<Vec<GeneratorCall>>>,
}

impl MockGenerator {
    /// Create a mock with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a free-text reply.
    pub fn with_text(self, reply: impl Into<String>) -> Self {
        self.text_replies.lock().unwrap().push_back(reply.into());
        self
    }

    /// Queue a structured reply.
    pub fn with_structured(self, reply: StructuredReply) -> Self {
        self.structured_replies.lock().unwrap().push_back(Ok(reply));
        self
    }

    /// Queue a provider failure for a structured call.
    pub fn with_structured_error(self, message: impl Into<String>) -> Self {
        self.structured_replies
            .lock()
            .unwrap()
            .push_back(Err(message.into()));
        self
    }

    /// All calls made to this mock.
    pub fn calls(&self) -> Vec<GeneratorCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        self.calls.lock().unwrap().push(GeneratorCall::Generate {
            messages: messages.len(),
        });
        self.text_replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AcquisitionError::generator_msg("mock: no scripted text reply"))
    }

    async fn generate_structured(
        &self,
        messages: &[ChatMessage],
        function: &FunctionSpec,
    ) -> Result<StructuredReply> {
        self.calls
            .lock()
            .unwrap()
            .push(GeneratorCall::GenerateStructured {
                function: function.name.clone(),
                messages: messages.len(),
            });
        match self.structured_replies.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(AcquisitionError::generator_msg(message)),
            None => Err(AcquisitionError::generator_msg(
                "mock: no scripted structured reply",
            )),
        }
    }
}

// =============================================================================
// MockListingSource
// =============================================================================

/// Record of a call made to the mock listing source.
#[derive(Debug, Clone)]
pub enum SourceCall {
    SearchPage { page: u32 },
    ListingDetail { listing_id: u64 },
    Metadata { category: MetadataCategory },
}

/// A mock listings API with scripted pages, details, and metadata.
///
/// Search pages are consumed in call order (so retry sequences are
/// scriptable); details are queued per listing id; metadata is a plain map.
#[derive(Default, Clone)]
pub struct MockListingSource {
    pages: Arc<Mutex<VecDeque<std::result::Result<SearchPage, SourceError>>>>,
    details: Arc<Mutex<HashMap<u64, VecDeque<std::result::Result<RawListing, SourceError>>>>>,
    metadata: Arc<Mutex<HashMap<MetadataCategory, serde_json::Value>>>,
    calls: Arc<Mutex<Vec<SourceCall>>>,
}

impl MockListingSource {
    /// Create a mock with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful search page.
    pub fn with_page(self, page: SearchPage) -> Self {
        self.pages.lock().unwrap().push_back(Ok(page));
        self
    }

    /// Queue a failed search page attempt.
    pub fn with_page_error(self, error: SourceError) -> Self {
        self.pages.lock().unwrap().push_back(Err(error));
        self
    }

    /// Queue a successful detail response for a listing id.
    pub fn with_detail(self, listing_id: u64, detail: RawListing) -> Self {
        self.details
            .lock()
            .unwrap()
            .entry(listing_id)
            .or_default()
            .push_back(Ok(detail));
        self
    }

    /// Queue a failed detail attempt for a listing id.
    pub fn with_detail_error(self, listing_id: u64, error: SourceError) -> Self {
        self.details
            .lock()
            .unwrap()
            .entry(listing_id)
            .or_default()
            .push_back(Err(error));
        self
    }

    /// Set a metadata category's payload.
    pub fn with_metadata(self, category: MetadataCategory, payload: serde_json::Value) -> Self {
        self.metadata.lock().unwrap().insert(category, payload);
        self
    }

    /// All calls made to this mock.
    pub fn calls(&self) -> Vec<SourceCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of metadata calls made.
    pub fn metadata_calls(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| matches!(call, SourceCall::Metadata { .. }))
            .count()
    }
}

#[async_trait]
impl ListingSource for MockListingSource {
    async fn search_page(
        &self,
        _params: &QueryParams,
        page: u32,
    ) -> std::result::Result<SearchPage, SourceError> {
        self.calls
            .lock()
            .unwrap()
            .push(SourceCall::SearchPage { page });
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(SourceError::Transport {
                    message: format!("mock: no scripted response for page {page}"),
                })
            })
    }

    async fn listing_detail(
        &self,
        listing_id: u64,
    ) -> std::result::Result<RawListing, SourceError> {
        self.calls
            .lock()
            .unwrap()
            .push(SourceCall::ListingDetail { listing_id });
        self.details
            .lock()
            .unwrap()
            .get_mut(&listing_id)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(SourceError::Transport {
                    message: format!("mock: no scripted detail for listing {listing_id}"),
                })
            })
    }

    async fn metadata(
        &self,
        category: MetadataCategory,
    ) -> std::result::Result<serde_json::Value, SourceError> {
        self.calls
            .lock()
            .unwrap()
            .push(SourceCall::Metadata { category });
        self.metadata
            .lock()
            .unwrap()
            .get(&category)
            .cloned()
            .ok_or_else(|| SourceError::Transport {
                message: format!("mock: no scripted metadata for {category}"),
            })
    }
}

// =============================================================================
// InstantSleeper
// =============================================================================

/// A sleeper that records every requested wait and returns immediately.
#[derive(Default, Clone)]
pub struct InstantSleeper {
    waits: Arc<Mutex<Vec<Duration>>>,
}

impl InstantSleeper {
    /// Create a sleeper with no recorded waits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every wait requested so far, in order.
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for InstantSleeper {
    async fn sleep(&self, wait: Duration) {
        self.waits.lock().unwrap().push(wait);
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// A small two-region taxonomy with realistic ids, shared by tests.
pub fn sample_taxonomy() -> Arc<LocationTaxonomy> {
    use crate::taxonomy::{District, Region, Suburb, VocabularyEntry};

    let vocab = |key: &str| VocabularyEntry {
        key: key.to_string(),
        label: Some(key.to_string()),
    };

    Arc::new(LocationTaxonomy::from_parts(
        vec![
            Region {
                id: 2,
                name: "Auckland".to_string(),
                districts: vec![District {
                    id: 76,
                    name: "Auckland City".to_string(),
                    suburbs: vec![
                        Suburb {
                            id: 4123,
                            name: "Ponsonby".to_string(),
                        },
                        Suburb {
                            id: 4130,
                            name: "Grey Lynn".to_string(),
                        },
                    ],
                }],
            },
            Region {
                id: 15,
                name: "Wellington".to_string(),
                districts: vec![
                    District {
                        id: 47,
                        name: "Wellington City".to_string(),
                        suburbs: vec![Suburb {
                            id: 2280,
                            name: "Te Aro".to_string(),
                        }],
                    },
                    District {
                        id: 46,
                        name: "Lower Hutt City".to_string(),
                        suburbs: vec![Suburb {
                            id: 2571,
                            name: "Petone".to_string(),
                        }],
                    },
                ],
            },
        ],
        vec![
            vocab("House"),
            vocab("Apartment"),
            vocab("Townhouse"),
            vocab("Unit"),
        ],
        vec![
            vocab("Auction"),
            vocab("Tender"),
            vocab("PriceByNegotiation"),
        ],
    ))
}

/// The normalized-listing schema used across tests.
pub fn sample_target_schema() -> Arc<TargetSchema> {
    let schema = serde_json::json!({
        "type": "object",
        "properties": {
            "listing_id": {"type": "integer"},
            "title": {"type": "string"},
            "address": {"type": ["string", "null"]},
            "price": {"type": "integer"},
            "bedrooms": {"type": "integer"},
            "bathrooms": {"type": "integer"},
            "amenities": {"type": "array", "items": {"type": "string"}},
            "furnished": {"type": "boolean"}
        },
        "required": [
            "listing_id", "title", "price", "bedrooms",
            "bathrooms", "amenities", "furnished"
        ],
        "additionalProperties": false
    });

    Arc::new(TargetSchema::from_value(schema).expect("sample schema compiles"))
}
