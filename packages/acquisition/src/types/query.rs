//! Deterministic query-parameter map.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Query parameters for the listings search endpoint.
///
/// Keys are unique; values are scalars or comma-joined lists, already
/// rendered as strings. Insertion order is preserved so the same profile
/// always produces the same serialized parameter set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParams {
    entries: IndexMap<String, String>,
}

impl QueryParams {
    /// An empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a scalar parameter, replacing any previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.entries.insert(key.into(), value.to_string());
    }

    /// Insert a comma-joined list parameter.
    pub fn insert_joined(&mut self, key: impl Into<String>, values: &[String]) {
        self.entries.insert(key.into(), values.join(","));
    }

    /// Look up a parameter value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no parameters are set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render as key/value pairs for an HTTP client.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_preserved() {
        let mut params = QueryParams::new();
        params.insert("district", 47);
        params.insert("price_min", 500_000);
        params.insert("price_max", 800_000);

        let keys: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["district", "price_min", "price_max"]);
    }

    #[test]
    fn test_unique_keys_replace() {
        let mut params = QueryParams::new();
        params.insert("suburb", 1);
        params.insert("suburb", 2);

        assert_eq!(params.len(), 1);
        assert_eq!(params.get("suburb"), Some("2"));
    }

    #[test]
    fn test_joined_list_values() {
        let mut params = QueryParams::new();
        params.insert_joined("property_type", &["House".into(), "Townhouse".into()]);
        assert_eq!(params.get("property_type"), Some("House,Townhouse"));
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let mut params = QueryParams::new();
        params.insert("region", 9);

        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value, serde_json::json!({"region": "9"}));
    }
}
