//! Preference profile consumed by the parameter builder.

use serde::{Deserialize, Serialize};

/// A user's declared search preferences.
///
/// This is the boundary object an interview stage emits. Absent numeric
/// bounds are omitted from the built query, never defaulted to zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchProfile {
    /// Free-text region name, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Free-text district name, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,

    /// Free-text suburb name, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suburb: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_bedrooms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bedrooms: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_bathrooms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bathrooms: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_carparks: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_carparks: Option<u32>,

    /// Desired property types, validated against the metadata vocabulary.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub property_types: Vec<String>,

    /// Desired sale methods, validated against the metadata vocabulary.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sale_methods: Vec<String>,
}

impl SearchProfile {
    /// True when any location level is named.
    pub fn has_location(&self) -> bool {
        self.region.is_some() || self.district.is_some() || self.suburb.is_some()
    }

    /// Inject a free-text fallback location as the district when the
    /// profile names no location at all. Returns whether it was applied.
    pub fn apply_fallback_location(&mut self, fallback: impl Into<String>) -> bool {
        if self.has_location() {
            return false;
        }
        self.district = Some(fallback.into());
        true
    }
}
