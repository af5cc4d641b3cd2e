//! Schema generation for strict structured replies.
//!
//! Derives a JSON schema from a Rust type with `schemars`, then rewrites it
//! into the shape the API's strict function-calling validation expects:
//! every object closed with `additionalProperties: false`, every property
//! listed in `required` (nullable ones included), and every `$ref` inlined.

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;

/// Types usable as a strict structured reply.
///
/// Blanket-implemented for anything that is `JsonSchema + DeserializeOwned`.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// Generate the strict-mode schema for this type.
    fn strict_schema() -> serde_json::Value {
        let schema = schema_for!(Self);
        let mut value = serde_json::to_value(schema).unwrap_or_default();

        let definitions = match &value {
            serde_json::Value::Object(map) => map.get("definitions").cloned(),
            _ => None,
        };

        sanitize(&mut value, definitions.as_ref());

        if let serde_json::Value::Object(map) = &mut value {
            map.remove("definitions");
            map.remove("$schema");
        }

        value
    }

    /// Schema name of this type.
    fn type_name() -> String {
        <Self as JsonSchema>::schema_name()
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

/// One recursive pass: inline `$ref`s, close objects, require every property.
fn sanitize(value: &mut serde_json::Value, definitions: Option<&serde_json::Value>) {
    match value {
        serde_json::Value::Object(map) => {
            if let Some(serde_json::Value::String(path)) = map.get("$ref").cloned() {
                if let Some(name) = path.strip_prefix("#/definitions/") {
                    if let Some(def) = definitions.and_then(|d| d.get(name)) {
                        *value = def.clone();
                        sanitize(value, definitions);
                        return;
                    }
                }
            }

            if map.get("type") == Some(&serde_json::Value::String("object".to_string())) {
                map.insert(
                    "additionalProperties".to_string(),
                    serde_json::Value::Bool(false),
                );
                if let Some(serde_json::Value::Object(props)) = map.get("properties") {
                    let keys: Vec<serde_json::Value> = props
                        .keys()
                        .map(|k| serde_json::Value::String(k.clone()))
                        .collect();
                    map.insert("required".to_string(), serde_json::Value::Array(keys));
                }
            }

            for (_, child) in map.iter_mut() {
                sanitize(child, definitions);
            }
        }
        serde_json::Value::Array(items) => {
            for item in items.iter_mut() {
                sanitize(item, definitions);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    struct Corrections {
        region: Option<String>,
        district: Option<String>,
        suburb: Option<String>,
    }

    #[derive(Deserialize, JsonSchema)]
    struct Verdict {
        approved: bool,
        corrections: Corrections,
    }

    #[test]
    fn test_all_properties_required_even_nullable() {
        let schema = Verdict::strict_schema();
        let root = schema.as_object().unwrap();

        let required: Vec<&str> = root["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert!(required.contains(&"approved"));
        assert!(required.contains(&"corrections"));
    }

    #[test]
    fn test_nested_ref_inlined_and_closed() {
        let schema = Verdict::strict_schema();
        let root = schema.as_object().unwrap();

        assert!(!root.contains_key("definitions"));
        assert!(!root.contains_key("$schema"));

        let corrections = &root["properties"]["corrections"];
        assert!(corrections.get("$ref").is_none(), "refs must be inlined");
        assert_eq!(corrections["additionalProperties"], false);

        let required: Vec<&str> = corrections["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert!(required.contains(&"region"));
        assert!(required.contains(&"district"));
        assert!(required.contains(&"suburb"));
    }

    #[test]
    fn test_schema_string_roundtrip_contains_closures() {
        let text = serde_json::to_string(&Verdict::strict_schema()).unwrap();
        assert!(text.contains("additionalProperties"));
    }
}
