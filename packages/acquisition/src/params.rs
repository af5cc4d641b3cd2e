//! Profile-to-query parameter building.
//!
//! Maps a preference profile onto the flat parameter set the search endpoint
//! understands, resolving free-text location names against the taxonomy and
//! producing match hints for the confirmation loop. Building never mutates
//! the taxonomy and is deterministic: the same profile against the same
//! taxonomy yields the same parameters and hints.

use std::sync::Arc;

use tracing::debug;

use crate::error::BuildError;
use crate::fuzzy;
use crate::taxonomy::{District, LocationTaxonomy, Region, Suburb, VocabularyEntry};
use crate::types::hints::MatchHints;
use crate::types::profile::SearchProfile;
use crate::types::query::QueryParams;

/// A built query: the parameters plus how the location inputs resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub params: QueryParams,
    pub hints: MatchHints,
}

/// Numeric profile bounds and their parameter keys.
const NUMERIC_FIELDS: [(&str, &str); 8] = [
    ("min_price", "price_min"),
    ("max_price", "price_max"),
    ("min_bedrooms", "bedrooms_min"),
    ("max_bedrooms", "bedrooms_max"),
    ("min_bathrooms", "bathrooms_min"),
    ("max_bathrooms", "bathrooms_max"),
    ("min_carparks", "car_spaces_min"),
    ("max_carparks", "car_spaces_max"),
];

/// Builds query parameters from a preference profile.
pub struct ParameterBuilder {
    taxonomy: Arc<LocationTaxonomy>,
}

impl ParameterBuilder {
    /// Create a builder over a loaded taxonomy.
    pub fn new(taxonomy: Arc<LocationTaxonomy>) -> Self {
        Self { taxonomy }
    }

    /// The taxonomy this builder resolves against.
    pub fn taxonomy(&self) -> &Arc<LocationTaxonomy> {
        &self.taxonomy
    }

    /// Build parameters and match hints from `profile`.
    ///
    /// Fails with [`BuildError::UnmappableValue`] when a categorical filter
    /// cannot be matched to the vocabulary even loosely; an unmatched
    /// location is not an error (the hints record the miss).
    pub fn build(&self, profile: &SearchProfile) -> Result<BuiltQuery, BuildError> {
        let mut hints = MatchHints::unresolved(
            profile.region.as_deref(),
            profile.district.as_deref(),
            profile.suburb.as_deref(),
        );

        let (region, district, suburb) = self.resolve_location(profile);

        if let Some(region) = region {
            hints.region.candidate = Some(region.name.clone());
            hints.region.resolved_id = Some(region.id);
        }
        if let Some(district) = district {
            hints.district.candidate = Some(district.name.clone());
            hints.district.resolved_id = Some(district.id);
        }
        if let Some(suburb) = suburb {
            hints.suburb.candidate = Some(suburb.name.clone());
            hints.suburb.resolved_id = Some(suburb.id);
        }

        let mut params = QueryParams::new();

        // Most specific resolved level wins.
        if let Some(suburb) = suburb {
            params.insert("suburb", suburb.id);
        } else if let Some(district) = district {
            params.insert("district", district.id);
        } else if let Some(region) = region {
            params.insert("region", region.id);
        }

        self.insert_numeric_ranges(profile, &mut params);

        if !profile.property_types.is_empty() {
            let selected = match_vocabulary(
                &profile.property_types,
                self.taxonomy.property_types(),
                "property_type",
            )?;
            params.insert_joined("property_type", &selected);
        }

        if !profile.sale_methods.is_empty() {
            let selected = match_vocabulary(
                &profile.sale_methods,
                self.taxonomy.sale_methods(),
                "sales_method",
            )?;
            params.insert_joined("sales_method", &selected);
        }

        debug!(params = params.len(), "query parameters built");
        Ok(BuiltQuery { params, hints })
    }

    /// Resolve the profile's location inputs against the taxonomy.
    ///
    /// Order is a contract:
    /// 1. a named district resolves within all regions' district lists,
    ///    capturing the owning region;
    /// 2. a named suburb resolves within the already-resolved district,
    ///    else globally across all districts (back-filling owners);
    /// 3. a named region resolves directly only when nothing else matched;
    /// 4. owners are back-propagated so a resolved suburb or district always
    ///    carries its ancestor chain when derivable.
    fn resolve_location(
        &self,
        profile: &SearchProfile,
    ) -> (Option<&Region>, Option<&District>, Option<&Suburb>) {
        let regions = self.taxonomy.regions();

        let mut region: Option<&Region> = None;
        let mut district: Option<&District> = None;
        let mut suburb: Option<&Suburb> = None;

        if let Some(input) = profile.district.as_deref() {
            for candidate_region in regions {
                if let Some(found) =
                    fuzzy::resolve(input, &candidate_region.districts, |d| &d.name)
                {
                    region = Some(candidate_region);
                    district = Some(found);
                    break;
                }
            }
        }

        if let (Some(input), Some(found_district)) = (profile.suburb.as_deref(), district) {
            suburb = fuzzy::resolve(input, &found_district.suburbs, |s| &s.name);
        }

        // Global fallback: search every district's suburb list.
        if let Some(input) = profile.suburb.as_deref() {
            if suburb.is_none() {
                'regions: for candidate_region in regions {
                    for candidate_district in &candidate_region.districts {
                        if let Some(found) =
                            fuzzy::resolve(input, &candidate_district.suburbs, |s| &s.name)
                        {
                            region = Some(candidate_region);
                            district = Some(candidate_district);
                            suburb = Some(found);
                            break 'regions;
                        }
                    }
                }
            }
        }

        if region.is_none() && district.is_none() && suburb.is_none() {
            if let Some(input) = profile.region.as_deref() {
                region = fuzzy::resolve(input, regions, |r| &r.name);
            }
        }

        // Back-propagate ancestors from the deepest match.
        if let Some(found_suburb) = suburb {
            if district.is_none() {
                if let Some((owner_region, owner_district)) =
                    self.taxonomy.suburb_owner(found_suburb.id)
                {
                    region = Some(owner_region);
                    district = Some(owner_district);
                }
            }
        }
        if let Some(found_district) = district {
            if region.is_none() {
                region = self.taxonomy.district_owner(found_district.id);
            }
        }

        (region, district, suburb)
    }

    fn insert_numeric_ranges(&self, profile: &SearchProfile, params: &mut QueryParams) {
        let values: [Option<u64>; 8] = [
            profile.min_price,
            profile.max_price,
            profile.min_bedrooms.map(u64::from),
            profile.max_bedrooms.map(u64::from),
            profile.min_bathrooms.map(u64::from),
            profile.max_bathrooms.map(u64::from),
            profile.min_carparks.map(u64::from),
            profile.max_carparks.map(u64::from),
        ];

        for ((_, param_key), value) in NUMERIC_FIELDS.iter().zip(values) {
            if let Some(value) = value {
                params.insert(*param_key, value);
            }
        }
    }
}

/// Match each input against the vocabulary: exact key first, then
/// case-insensitive. An unmatched value fails the build rather than being
/// silently dropped.
fn match_vocabulary(
    values: &[String],
    vocabulary: &[VocabularyEntry],
    field: &'static str,
) -> Result<Vec<String>, BuildError> {
    values
        .iter()
        .map(|value| {
            vocabulary
                .iter()
                .find(|entry| entry.key == *value)
                .or_else(|| {
                    vocabulary
                        .iter()
                        .find(|entry| entry.key.eq_ignore_ascii_case(value))
                })
                .map(|entry| entry.key.clone())
                .ok_or_else(|| BuildError::UnmappableValue {
                    field,
                    value: value.clone(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_taxonomy;
    use proptest::prelude::*;

    fn builder() -> ParameterBuilder {
        ParameterBuilder::new(sample_taxonomy())
    }

    #[test]
    fn test_district_resolution_captures_region() {
        let profile = SearchProfile {
            district: Some("wellington city".into()),
            ..Default::default()
        };

        let built = builder().build(&profile).unwrap();
        assert_eq!(built.params.get("district"), Some("47"));
        assert_eq!(built.hints.district.candidate.as_deref(), Some("Wellington City"));
        assert_eq!(built.hints.region.candidate.as_deref(), Some("Wellington"));
        assert_eq!(built.hints.region.resolved_id, Some(15));
    }

    #[test]
    fn test_suburb_within_named_district() {
        let profile = SearchProfile {
            district: Some("Auckland City".into()),
            suburb: Some("ponsonby".into()),
            ..Default::default()
        };

        let built = builder().build(&profile).unwrap();
        assert_eq!(built.params.get("suburb"), Some("4123"));
        assert_eq!(built.params.get("district"), None, "suburb wins the location slot");
        assert_eq!(built.hints.suburb.resolved_id, Some(4123));
    }

    #[test]
    fn test_global_suburb_backfills_ancestors() {
        let profile = SearchProfile {
            suburb: Some("Te Aro".into()),
            ..Default::default()
        };

        let built = builder().build(&profile).unwrap();
        assert_eq!(built.params.get("suburb"), Some("2280"));
        assert_eq!(built.hints.district.candidate.as_deref(), Some("Wellington City"));
        assert_eq!(built.hints.district.resolved_id, Some(47));
        assert_eq!(built.hints.region.candidate.as_deref(), Some("Wellington"));
    }

    #[test]
    fn test_region_only_resolution() {
        let profile = SearchProfile {
            region: Some("auckland".into()),
            ..Default::default()
        };

        let built = builder().build(&profile).unwrap();
        assert_eq!(built.params.get("region"), Some("2"));
        assert_eq!(built.params.get("district"), None);
    }

    #[test]
    fn test_misspelled_suburb_resolves_approximately() {
        let profile = SearchProfile {
            suburb: Some("Ponsonbee".into()),
            ..Default::default()
        };

        let built = builder().build(&profile).unwrap();
        assert_eq!(built.hints.suburb.candidate.as_deref(), Some("Ponsonby"));
    }

    #[test]
    fn test_unmatched_location_is_not_an_error() {
        let profile = SearchProfile {
            suburb: Some("Atlantis".into()),
            ..Default::default()
        };

        let built = builder().build(&profile).unwrap();
        assert!(built.params.is_empty());
        assert!(!built.hints.suburb.is_resolved());
        assert_eq!(built.hints.suburb.input.as_deref(), Some("Atlantis"));
    }

    #[test]
    fn test_numeric_ranges_mapped_and_absent_keys_omitted() {
        let profile = SearchProfile {
            min_price: Some(500_000),
            max_price: Some(850_000),
            min_bedrooms: Some(3),
            ..Default::default()
        };

        let built = builder().build(&profile).unwrap();
        assert_eq!(built.params.get("price_min"), Some("500000"));
        assert_eq!(built.params.get("price_max"), Some("850000"));
        assert_eq!(built.params.get("bedrooms_min"), Some("3"));
        assert_eq!(built.params.get("bedrooms_max"), None);
        assert_eq!(built.params.get("bathrooms_min"), None);
        assert_eq!(built.params.get("car_spaces_min"), None);
    }

    #[test]
    fn test_property_types_case_insensitive() {
        let profile = SearchProfile {
            property_types: vec!["house".into(), "Apartment".into()],
            ..Default::default()
        };

        let built = builder().build(&profile).unwrap();
        assert_eq!(built.params.get("property_type"), Some("House,Apartment"));
    }

    #[test]
    fn test_unknown_property_type_fails_build() {
        let profile = SearchProfile {
            property_types: vec!["Castle".into()],
            ..Default::default()
        };

        let err = builder().build(&profile).unwrap_err();
        assert_eq!(
            err,
            BuildError::UnmappableValue {
                field: "property_type",
                value: "Castle".into(),
            }
        );
    }

    #[test]
    fn test_unknown_sale_method_fails_build() {
        let profile = SearchProfile {
            sale_methods: vec!["Barter".into()],
            ..Default::default()
        };

        let err = builder().build(&profile).unwrap_err();
        assert!(matches!(
            err,
            BuildError::UnmappableValue {
                field: "sales_method",
                ..
            }
        ));
    }

    #[test]
    fn test_build_is_idempotent() {
        let profile = SearchProfile {
            district: Some("Wellington City".into()),
            suburb: Some("Te Aro".into()),
            min_price: Some(400_000),
            property_types: vec!["House".into()],
            ..Default::default()
        };

        let builder = builder();
        let first = builder.build(&profile).unwrap();
        let second = builder.build(&profile).unwrap();
        assert_eq!(first, second);
    }

    proptest! {
        /// Resolving any suburb by its exact name yields hints whose
        /// district and region are the suburb's true ancestors.
        #[test]
        fn prop_suburb_hints_carry_true_ancestors(index in 0usize..64) {
            let taxonomy = sample_taxonomy();

            let suburbs: Vec<(String, u32, u32, u32)> = taxonomy
                .regions()
                .iter()
                .flat_map(|r| {
                    r.districts.iter().flat_map(move |d| {
                        d.suburbs
                            .iter()
                            .map(move |s| (s.name.clone(), s.id, d.id, r.id))
                    })
                })
                .collect();
            prop_assume!(!suburbs.is_empty());

            let (name, suburb_id, district_id, region_id) =
                suburbs[index % suburbs.len()].clone();

            let profile = SearchProfile {
                suburb: Some(name),
                ..Default::default()
            };
            let built = ParameterBuilder::new(taxonomy).build(&profile).unwrap();

            prop_assert_eq!(built.hints.suburb.resolved_id, Some(suburb_id));
            prop_assert_eq!(built.hints.district.resolved_id, Some(district_id));
            prop_assert_eq!(built.hints.region.resolved_id, Some(region_id));
        }
    }
}
