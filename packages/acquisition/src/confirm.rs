//! Location-mapping confirmation loop.
//!
//! Submits the match hints from a build to the text-generation capability
//! for a structured verdict, feeding correction suggestions back into the
//! parameter builder for a bounded number of rounds.
//!
//! The failure mode here is degraded-continue, not abort: an unconfirmed
//! mapping still yields a usable search, so exhaustion proceeds with the
//! last built parameters.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{debug, info, warn};

use openai_client::StructuredOutput;

use crate::error::{AcquisitionError, Result};
use crate::params::{BuiltQuery, ParameterBuilder};
use crate::prompts;
use crate::traits::generator::{ChatMessage, FunctionSpec, StructuredReply, TextGenerator};
use crate::types::hints::MatchHints;
use crate::types::profile::SearchProfile;

/// Default number of confirmation rounds.
pub const DEFAULT_CONFIRM_ATTEMPTS: u32 = 2;

/// Per-level correction suggestions from a rejected verdict.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct MappingCorrections {
    /// Better region name, when the region mapping was wrong.
    pub region: Option<String>,

    /// Better district name, when the district mapping was wrong.
    pub district: Option<String>,

    /// Better suburb name, when the suburb mapping was wrong.
    pub suburb: Option<String>,
}

impl MappingCorrections {
    /// True when no level carries a suggestion.
    pub fn is_empty(&self) -> bool {
        self.region.is_none() && self.district.is_none() && self.suburb.is_none()
    }

    /// Apply the suggestions onto a profile, replacing only suggested levels.
    pub fn apply(&self, profile: &mut SearchProfile) {
        if let Some(region) = &self.region {
            profile.region = Some(region.clone());
        }
        if let Some(district) = &self.district {
            profile.district = Some(district.clone());
        }
        if let Some(suburb) = &self.suburb {
            profile.suburb = Some(suburb.clone());
        }
    }
}

/// Structured verdict on a location mapping.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct MappingVerdict {
    /// Unconditional approval of every level.
    pub approved: bool,

    /// Suggestions for the levels that were wrong; empty on approval.
    #[serde(default)]
    pub corrections: MappingCorrections,
}

/// Terminal state of a confirmation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmStatus {
    /// The capability approved the mapping.
    Approved,

    /// Rounds were exhausted or no corrections were offered; the pipeline
    /// continues with the last built parameters.
    BestEffort,
}

/// Outcome of a confirmation run.
#[derive(Debug, Clone)]
pub struct ConfirmOutcome {
    /// The last built query (approved or best-effort).
    pub query: BuiltQuery,

    /// The profile after any applied corrections.
    pub profile: SearchProfile,

    /// How the loop terminated.
    pub status: ConfirmStatus,

    /// Verdict rounds consumed.
    pub attempts: u32,
}

/// Bounded confirm/correct loop over the parameter builder.
pub struct ConfirmationLoop {
    generator: Arc<dyn TextGenerator>,
    max_attempts: u32,
}

impl ConfirmationLoop {
    /// Create a loop with the default attempt bound.
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            max_attempts: DEFAULT_CONFIRM_ATTEMPTS,
        }
    }

    /// Set the maximum number of verdict rounds.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Run the loop: build, submit for a verdict, apply corrections, rebuild.
    ///
    /// Every round consumes one attempt, including rounds where the verdict
    /// could not be obtained or parsed. Correction rounds rebuild through
    /// `builder`, so a returned [`ConfirmOutcome`] always carries the query
    /// matching its profile.
    pub async fn confirm(
        &self,
        builder: &ParameterBuilder,
        profile: &SearchProfile,
    ) -> Result<ConfirmOutcome> {
        let mut profile = profile.clone();
        let mut query = builder.build(&profile)?;

        for attempt in 1..=self.max_attempts {
            let verdict = match self.request_verdict(&query.hints).await {
                Ok(verdict) => verdict,
                Err(error) => {
                    warn!(attempt, error = %error, "confirmation attempt failed");
                    continue;
                }
            };

            if verdict.approved {
                info!(attempt, "location mapping approved");
                return Ok(ConfirmOutcome {
                    query,
                    profile,
                    status: ConfirmStatus::Approved,
                    attempts: attempt,
                });
            }

            if verdict.corrections.is_empty() {
                info!(attempt, "verdict offered no corrections; keeping last mapping");
                return Ok(ConfirmOutcome {
                    query,
                    profile,
                    status: ConfirmStatus::BestEffort,
                    attempts: attempt,
                });
            }

            debug!(attempt, corrections = ?verdict.corrections, "applying corrections");
            verdict.corrections.apply(&mut profile);
            query = builder.build(&profile)?;
        }

        warn!(
            max_attempts = self.max_attempts,
            "mapping not approved; proceeding with best-effort mapping"
        );
        Ok(ConfirmOutcome {
            query,
            profile,
            status: ConfirmStatus::BestEffort,
            attempts: self.max_attempts,
        })
    }

    async fn request_verdict(&self, hints: &MatchHints) -> Result<MappingVerdict> {
        let messages = [
            ChatMessage::system(prompts::CONFIRMATION_SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "The location mapping under review:\n{}",
                hints.describe()
            )),
        ];
        let function = FunctionSpec {
            name: prompts::CONFIRMATION_FUNCTION_NAME.to_string(),
            description: prompts::CONFIRMATION_FUNCTION_DESCRIPTION.to_string(),
            parameters: MappingVerdict::strict_schema(),
        };

        match self.generator.generate_structured(&messages, &function).await? {
            StructuredReply::Call { arguments } => serde_json::from_str(&arguments)
                .map_err(|e| AcquisitionError::generator_msg(format!("unparseable verdict: {e}"))),
            StructuredReply::Text(text) => Err(AcquisitionError::generator_msg(format!(
                "expected a structured verdict, got free text: {text:.80}"
            ))),
        }
    }
}
