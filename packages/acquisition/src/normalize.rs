//! Schema normalization of raw listings.
//!
//! Each raw record goes to the text-generation capability under
//! function-call discipline, constrained to the target schema. The reply is
//! parsed, default-filled, and validated; parse or validation failures feed
//! a corrective instruction back and consume one attempt. A record either
//! comes out fully schema-valid or fails; nothing partial survives.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{AcquisitionError, NormalizeError, Result};
use crate::prompts;
use crate::traits::generator::{ChatMessage, FunctionSpec, StructuredReply, TextGenerator};
use crate::types::listing::{NormalizedRecord, RawListing};

/// Default per-record attempt budget.
pub const DEFAULT_RETRY_LIMIT: u32 = 2;

/// What to do with the batch when one record exhausts its budget.
///
/// The reference behavior aborts the whole batch; skipping records the
/// failure in the outcome and continues. Provider-level failures (network,
/// auth) abort under either policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// First unrecoverable record fails the whole batch.
    #[default]
    AbortBatch,

    /// Log, record, and continue with the remaining records.
    SkipRecord,
}

/// A record the normalizer gave up on under [`FailurePolicy::SkipRecord`].
#[derive(Debug, Clone)]
pub struct SkippedRecord {
    /// Index of the record in the input batch.
    pub index: usize,

    /// The last corrective message before the budget ran out.
    pub reason: String,
}

/// Normalized records plus any skipped ones.
#[derive(Debug, Clone, Default)]
pub struct NormalizeOutcome {
    pub records: Vec<NormalizedRecord>,
    pub skipped: Vec<SkippedRecord>,
}

/// The target JSON Schema, compiled once and shared read-only.
pub struct TargetSchema {
    raw: serde_json::Value,
    validator: jsonschema::Validator,
}

impl TargetSchema {
    /// Compile a schema from its JSON document.
    pub fn from_value(raw: serde_json::Value) -> std::result::Result<Self, NormalizeError> {
        let validator = jsonschema::validator_for(&raw)
            .map_err(|e| NormalizeError::SchemaCompile(e.to_string()))?;
        Ok(Self { raw, validator })
    }

    /// Load and compile a schema from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let raw: serde_json::Value = serde_json::from_str(&text)?;
        Ok(Self::from_value(raw)?)
    }

    /// The schema document.
    pub fn raw(&self) -> &serde_json::Value {
        &self.raw
    }

    /// The schema document, pretty-printed for prompt attachment.
    pub fn to_pretty_string(&self) -> String {
        serde_json::to_string_pretty(&self.raw).unwrap_or_default()
    }

    /// The schema's property map, when it declares one.
    pub fn properties(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.raw.get("properties")?.as_object()
    }

    /// Validate an instance, returning the first error message.
    pub fn validate(&self, instance: &serde_json::Value) -> std::result::Result<(), String> {
        match self.validator.iter_errors(instance).next() {
            None => Ok(()),
            Some(error) => Err(error.to_string()),
        }
    }

    /// Fill missing or mistyped properties with canonical defaults.
    ///
    /// For each declared property whose value is absent or not of an
    /// allowed type, the replacement follows a fixed preference order over
    /// the allowed types: array, object, string, integer/number, boolean,
    /// else null. An absent value is kept absent when `null` is explicitly
    /// allowed. Booleans are never coerced from integers.
    pub fn apply_defaults(&self, record: &mut NormalizedRecord) {
        let Some(properties) = self.properties() else {
            return;
        };

        for (key, subschema) in properties {
            let types = allowed_types(subschema);

            let current = record.get(key);
            let is_nullish = current.map_or(true, serde_json::Value::is_null);

            if is_nullish && types.iter().any(|t| t == "null") {
                continue;
            }

            let matches = current.map_or(false, |value| {
                !value.is_null() && types.iter().any(|t| matches_type(value, t))
            });

            if !matches {
                record.insert(key.clone(), default_for(&types));
            }
        }
    }
}

impl std::fmt::Debug for TargetSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetSchema").field("raw", &self.raw).finish()
    }
}

/// Allowed type names of a property subschema (single or list form).
fn allowed_types(subschema: &serde_json::Value) -> Vec<String> {
    match subschema.get("type") {
        Some(serde_json::Value::String(single)) => vec![single.clone()],
        Some(serde_json::Value::Array(list)) => list
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

fn matches_type(value: &serde_json::Value, type_name: &str) -> bool {
    match type_name {
        "array" => value.is_array(),
        "object" => value.is_object(),
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        _ => false,
    }
}

/// Canonical default in the fixed preference order.
fn default_for(types: &[String]) -> serde_json::Value {
    let has = |t: &str| types.iter().any(|candidate| candidate == t);

    if has("array") {
        serde_json::Value::Array(Vec::new())
    } else if has("object") {
        serde_json::Value::Object(serde_json::Map::new())
    } else if has("string") {
        serde_json::Value::String(String::new())
    } else if has("integer") || has("number") {
        serde_json::Value::from(0)
    } else if has("boolean") {
        serde_json::Value::Bool(false)
    } else {
        serde_json::Value::Null
    }
}

/// Normalizes raw listings record by record.
pub struct SchemaNormalizer {
    generator: Arc<dyn TextGenerator>,
    schema: Arc<TargetSchema>,
    retry_limit: u32,
    failure_policy: FailurePolicy,
}

impl SchemaNormalizer {
    /// Create a normalizer with the default budget and abort-batch policy.
    pub fn new(generator: Arc<dyn TextGenerator>, schema: Arc<TargetSchema>) -> Self {
        Self {
            generator,
            schema,
            retry_limit: DEFAULT_RETRY_LIMIT,
            failure_policy: FailurePolicy::default(),
        }
    }

    /// Set the per-record attempt budget.
    pub fn with_retry_limit(mut self, retry_limit: u32) -> Self {
        self.retry_limit = retry_limit.max(1);
        self
    }

    /// Set the batch failure policy.
    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    /// Normalize a batch, reporting progress per record.
    pub async fn normalize(&self, raw: &[RawListing]) -> Result<NormalizeOutcome> {
        let total = raw.len();
        let mut outcome = NormalizeOutcome::default();

        for (index, record) in raw.iter().enumerate() {
            info!(record = index + 1, total = total, "normalizing record");

            match self.normalize_one(index, record).await {
                Ok(normalized) => {
                    info!(record = index + 1, total = total, "record normalized");
                    outcome.records.push(normalized);
                }
                Err(AcquisitionError::Normalize(error))
                    if self.failure_policy == FailurePolicy::SkipRecord =>
                {
                    warn!(
                        record = index + 1,
                        total = total,
                        error = %error,
                        "record failed normalization; skipping"
                    );
                    outcome.skipped.push(SkippedRecord {
                        index,
                        reason: error.to_string(),
                    });
                }
                Err(error) => return Err(error),
            }
        }

        Ok(outcome)
    }

    /// Normalize one record within the attempt budget.
    async fn normalize_one(&self, index: usize, raw: &RawListing) -> Result<NormalizedRecord> {
        let mut messages = vec![
            ChatMessage::system(prompts::NORMALIZER_SYSTEM_PROMPT),
            ChatMessage::system_named("schema", self.schema.to_pretty_string()),
            ChatMessage::system_named("raw_record", serde_json::to_string(raw)?),
        ];
        let function = FunctionSpec {
            name: prompts::NORMALIZER_FUNCTION_NAME.to_string(),
            description: prompts::NORMALIZER_FUNCTION_DESCRIPTION.to_string(),
            parameters: self.schema.raw().clone(),
        };

        let mut last_failure = String::from("no structured reply produced");

        for attempt in 1..=self.retry_limit {
            let reply = self.generator.generate_structured(&messages, &function).await?;

            let arguments = match reply {
                StructuredReply::Call { arguments } => arguments,
                StructuredReply::Text(_) => {
                    debug!(attempt = attempt, "reply was not a structured call");
                    last_failure = "reply was not a structured function call".to_string();
                    messages.push(ChatMessage::user(prompts::CORRECTIVE_CALL_REQUIRED));
                    continue;
                }
            };

            let parsed: serde_json::Value = match serde_json::from_str(&arguments) {
                Ok(value) => value,
                Err(error) => {
                    debug!(attempt = attempt, error = %error, "arguments were not valid JSON");
                    last_failure = format!("invalid JSON: {error}");
                    messages.push(ChatMessage::user(prompts::CORRECTIVE_INVALID_JSON));
                    continue;
                }
            };

            // A single-element array unwraps into its lone object.
            let parsed = match parsed {
                serde_json::Value::Array(mut items) if items.len() == 1 => items.remove(0),
                other => other,
            };

            let mut object = match parsed {
                serde_json::Value::Object(map) => map,
                _ => {
                    debug!(attempt = attempt, "payload was not a single object");
                    last_failure = "payload was not a single JSON object".to_string();
                    messages.push(ChatMessage::user(prompts::CORRECTIVE_OBJECT_REQUIRED));
                    continue;
                }
            };

            self.schema.apply_defaults(&mut object);

            let candidate = serde_json::Value::Object(object);
            match self.schema.validate(&candidate) {
                Ok(()) => {
                    if let serde_json::Value::Object(map) = candidate {
                        return Ok(map);
                    }
                }
                Err(message) => {
                    debug!(attempt = attempt, error = %message, "validation failed");
                    messages.push(ChatMessage::user(format!(
                        "Validation error ({message}). Please correct your JSON output."
                    )));
                    last_failure = message;
                }
            }
        }

        Err(NormalizeError::AttemptsExhausted {
            index,
            attempts: self.retry_limit,
            reason: last_failure,
        }
        .into())
    }
}
