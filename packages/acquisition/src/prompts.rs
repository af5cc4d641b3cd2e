//! System prompts and function metadata for the generation-backed stages.

/// Role instruction for the record normalizer.
pub const NORMALIZER_SYSTEM_PROMPT: &str = "You are a data normalization assistant. \
You receive one raw property listing record and a JSON Schema. \
Convert the raw record into a single JSON object that conforms exactly to the schema. \
Use the raw record's values wherever they exist; do not invent data. \
Return only the JSON object, with no extra text or explanation.";

/// Function the normalizer forces on every reply.
pub const NORMALIZER_FUNCTION_NAME: &str = "emit_normalized_listing";

/// What the normalizer's function emits.
pub const NORMALIZER_FUNCTION_DESCRIPTION: &str = "Emit one normalized property listing \
record as a JSON object conforming exactly to the attached schema.";

/// Corrective instruction when the reply was not a structured call.
pub const CORRECTIVE_CALL_REQUIRED: &str =
    "Please return ONLY the JSON object matching the schema, with no extra text.";

/// Corrective instruction when the call's arguments were not valid JSON.
pub const CORRECTIVE_INVALID_JSON: &str =
    "Invalid JSON. Please return only the JSON object.";

/// Corrective instruction when the parsed payload was not a single object.
pub const CORRECTIVE_OBJECT_REQUIRED: &str = "Expected a JSON object. Please correct.";

/// Role instruction for the location-mapping confirmation.
pub const CONFIRMATION_SYSTEM_PROMPT: &str = "You are a metadata-mapping assistant. \
A user's free-text location has been resolved against a location taxonomy. \
Review each level of the mapping and decide whether it is correct. \
If every mapping is correct, approve it. \
If any mapping is missing or wrong, reject it and suggest a better name for each \
incorrect level. Offer corrections only when you are reasonably confident.";

/// Function the confirmation loop forces on every reply.
pub const CONFIRMATION_FUNCTION_NAME: &str = "confirm_location_mapping";

/// What the confirmation function emits.
pub const CONFIRMATION_FUNCTION_DESCRIPTION: &str = "Emit a verdict on the location \
mapping: approved, or rejected with per-level correction suggestions.";
