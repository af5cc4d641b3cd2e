//! Location taxonomy and metadata cache.
//!
//! The taxonomy is a region → district → suburb tree plus the categorical
//! vocabularies (property types, sale methods), loaded once from a local
//! cache file and refreshed only on explicit request or cache miss. After
//! load the tree is read-only; it is shared as `Arc<LocationTaxonomy>` and
//! a refresh produces a new value rather than mutating the old one.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::artifacts;
use crate::error::MetadataError;
use crate::traits::source::{ListingSource, MetadataCategory};

/// A suburb: a leaf of the taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suburb {
    #[serde(rename = "SuburbId")]
    pub id: u32,

    #[serde(rename = "Name")]
    pub name: String,
}

/// A district and its suburbs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct District {
    #[serde(rename = "DistrictId")]
    pub id: u32,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Suburbs", default)]
    pub suburbs: Vec<Suburb>,
}

/// A region and its districts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    #[serde(rename = "LocalityId")]
    pub id: u32,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Districts", default)]
    pub districts: Vec<District>,
}

/// One entry of a categorical vocabulary (property types, sale methods).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    #[serde(rename = "Key")]
    pub key: String,

    #[serde(rename = "Value", default)]
    pub label: Option<String>,
}

/// Category-keyed metadata cache backed by one local JSON file.
///
/// Each category's raw payload is stored under its name; the file is
/// replaced atomically so a refresh cannot corrupt a concurrent read.
pub struct MetadataStore {
    source: Arc<dyn ListingSource>,
    cache_path: PathBuf,
}

impl MetadataStore {
    /// Create a store over `source`, caching at `cache_path`.
    pub fn new(source: Arc<dyn ListingSource>, cache_path: impl Into<PathBuf>) -> Self {
        Self {
            source,
            cache_path: cache_path.into(),
        }
    }

    /// Path of the cache file.
    pub fn cache_path(&self) -> &std::path::Path {
        &self.cache_path
    }

    /// Get one category's payload, fetching on miss or when forced.
    pub async fn get(
        &self,
        category: MetadataCategory,
        force_refresh: bool,
    ) -> Result<serde_json::Value, MetadataError> {
        let mut cache = match artifacts::read_json_lenient(&self.cache_path) {
            Some(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };

        if !force_refresh {
            if let Some(cached) = cache.get(category.as_str()) {
                debug!(category = %category, "metadata cache hit");
                return Ok(cached.clone());
            }
        }

        info!(category = %category, force_refresh, "fetching metadata");
        let payload = self.source.metadata(category).await?;

        cache.insert(category.as_str().to_string(), payload.clone());
        artifacts::write_json_atomic(&self.cache_path, &serde_json::Value::Object(cache))?;

        Ok(payload)
    }
}

/// The in-memory location taxonomy plus categorical vocabularies.
///
/// Read-only after load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationTaxonomy {
    regions: Vec<Region>,
    property_types: Vec<VocabularyEntry>,
    sale_methods: Vec<VocabularyEntry>,
}

impl LocationTaxonomy {
    /// Build a taxonomy directly from parts (primarily for tests).
    pub fn from_parts(
        regions: Vec<Region>,
        property_types: Vec<VocabularyEntry>,
        sale_methods: Vec<VocabularyEntry>,
    ) -> Self {
        Self {
            regions,
            property_types,
            sale_methods,
        }
    }

    /// Load from the metadata store, honoring the cache.
    pub async fn load(store: &MetadataStore) -> Result<Arc<Self>, MetadataError> {
        Self::load_inner(store, false).await
    }

    /// Force-refresh every category and return a new taxonomy.
    pub async fn reload(store: &MetadataStore) -> Result<Arc<Self>, MetadataError> {
        Self::load_inner(store, true).await
    }

    async fn load_inner(
        store: &MetadataStore,
        force_refresh: bool,
    ) -> Result<Arc<Self>, MetadataError> {
        let regions = parse_category::<Vec<Region>>(
            store.get(MetadataCategory::Regions, force_refresh).await?,
            "Regions",
        )?;
        let property_types = parse_category::<Vec<VocabularyEntry>>(
            store
                .get(MetadataCategory::PropertyTypes, force_refresh)
                .await?,
            "PropertyTypes",
        )?;
        let sale_methods = parse_category::<Vec<VocabularyEntry>>(
            store
                .get(MetadataCategory::SalesMethods, force_refresh)
                .await?,
            "SalesMethods",
        )?;

        info!(
            regions = regions.len(),
            property_types = property_types.len(),
            sale_methods = sale_methods.len(),
            "taxonomy loaded"
        );

        Ok(Arc::new(Self {
            regions,
            property_types,
            sale_methods,
        }))
    }

    /// All regions, in server order.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Property-type vocabulary.
    pub fn property_types(&self) -> &[VocabularyEntry] {
        &self.property_types
    }

    /// Sale-method vocabulary.
    pub fn sale_methods(&self) -> &[VocabularyEntry] {
        &self.sale_methods
    }

    /// The region owning a district id.
    pub fn district_owner(&self, district_id: u32) -> Option<&Region> {
        self.regions
            .iter()
            .find(|r| r.districts.iter().any(|d| d.id == district_id))
    }

    /// The region and district owning a suburb id.
    pub fn suburb_owner(&self, suburb_id: u32) -> Option<(&Region, &District)> {
        for region in &self.regions {
            for district in &region.districts {
                if district.suburbs.iter().any(|s| s.id == suburb_id) {
                    return Some((region, district));
                }
            }
        }
        None
    }
}

fn parse_category<T: serde::de::DeserializeOwned>(
    payload: serde_json::Value,
    category: &'static str,
) -> Result<T, MetadataError> {
    serde_json::from_value(payload).map_err(|e| MetadataError::Malformed {
        category,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockListingSource;

    fn sample_regions() -> serde_json::Value {
        serde_json::json!([
            {
                "LocalityId": 2,
                "Name": "Auckland",
                "Districts": [
                    {
                        "DistrictId": 76,
                        "Name": "Auckland City",
                        "Suburbs": [
                            {"SuburbId": 4123, "Name": "Ponsonby"},
                            {"SuburbId": 4130, "Name": "Grey Lynn"},
                        ],
                    },
                ],
            },
            {
                "LocalityId": 15,
                "Name": "Wellington",
                "Districts": [
                    {
                        "DistrictId": 47,
                        "Name": "Wellington City",
                        "Suburbs": [
                            {"SuburbId": 2280, "Name": "Te Aro"},
                        ],
                    },
                ],
            },
        ])
    }

    fn mock_source() -> Arc<MockListingSource> {
        Arc::new(
            MockListingSource::new()
                .with_metadata(MetadataCategory::Regions, sample_regions())
                .with_metadata(
                    MetadataCategory::PropertyTypes,
                    serde_json::json!([
                        {"Key": "House", "Value": "House"},
                        {"Key": "Apartment", "Value": "Apartment"},
                    ]),
                )
                .with_metadata(
                    MetadataCategory::SalesMethods,
                    serde_json::json!([
                        {"Key": "Auction", "Value": "Auction"},
                    ]),
                ),
        )
    }

    #[tokio::test]
    async fn test_load_caches_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("metadata.json");
        let source = mock_source();
        let store = MetadataStore::new(source.clone(), &cache_path);

        let taxonomy = LocationTaxonomy::load(&store).await.unwrap();
        assert_eq!(taxonomy.regions().len(), 2);
        assert_eq!(source.metadata_calls(), 3);

        // Second load is served from the cache file.
        let again = LocationTaxonomy::load(&store).await.unwrap();
        assert_eq!(again.regions().len(), 2);
        assert_eq!(source.metadata_calls(), 3);

        let cache = artifacts::read_json_lenient(&cache_path).unwrap();
        assert!(cache.get("Regions").is_some());
        assert!(cache.get("PropertyTypes").is_some());
    }

    #[tokio::test]
    async fn test_reload_forces_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let source = mock_source();
        let store = MetadataStore::new(source.clone(), dir.path().join("metadata.json"));

        LocationTaxonomy::load(&store).await.unwrap();
        assert_eq!(source.metadata_calls(), 3);

        LocationTaxonomy::reload(&store).await.unwrap();
        assert_eq!(source.metadata_calls(), 6);
    }

    #[tokio::test]
    async fn test_ancestor_lookups() {
        let dir = tempfile::tempdir().unwrap();
        let store = MetadataStore::new(mock_source(), dir.path().join("metadata.json"));
        let taxonomy = LocationTaxonomy::load(&store).await.unwrap();

        let region = taxonomy.district_owner(47).unwrap();
        assert_eq!(region.name, "Wellington");

        let (region, district) = taxonomy.suburb_owner(4130).unwrap();
        assert_eq!(region.name, "Auckland");
        assert_eq!(district.name, "Auckland City");

        assert!(taxonomy.suburb_owner(99999).is_none());
    }

    #[tokio::test]
    async fn test_malformed_payload_is_typed() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(
            MockListingSource::new()
                .with_metadata(MetadataCategory::Regions, serde_json::json!("not a list")),
        );
        let store = MetadataStore::new(source, dir.path().join("metadata.json"));

        let err = LocationTaxonomy::load(&store).await.unwrap_err();
        assert!(matches!(
            err,
            MetadataError::Malformed {
                category: "Regions",
                ..
            }
        ));
    }
}
