#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Evidence map core.
//!
//! A [`MapInstance`] bundles everything one map needs: region geometry,
//! the incident set, filters, selection, viewport and presenter state.
//! Nothing is global, so any number of instances can coexist.

pub mod bounds;
pub mod config;
pub mod instance;
mod refresh;
pub mod style;

pub use bounds::{MapBoundsAdjuster, TileFit};
pub use config::{MapConfig, TileViewConfig};
pub use instance::{FeatureEvent, MapInstance, VectorFeature};
pub use style::{FeatureStyle, feature_style, hover_style};

use thiserror::Error;

/// Errors that can occur while loading map configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the config file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not a valid configuration.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Errors that can occur while driving a map instance.
#[derive(Debug, Error)]
pub enum MapError {
    /// An incident feed was not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
pub(crate) mod test_support {
    use evidence_map_region::RegionStore;
    use evidence_map_region_models::{RegionId, RegionLevel, RegionRecord};
    use serde_json::json;

    pub fn boxed(id: i64, name: &str, parent: Option<i64>, lng: [f64; 2], lat: [f64; 2]) -> RegionRecord {
        RegionRecord {
            id: RegionId(id),
            name: name.to_string(),
            parent_id: parent.map(RegionId),
            geometry: Some(json!({
                "type": "Polygon",
                "coordinates": [[
                    [lng[0], lat[0]],
                    [lng[1], lat[0]],
                    [lng[1], lat[1]],
                    [lng[0], lat[1]],
                    [lng[0], lat[0]]
                ]]
            })),
        }
    }

    pub fn provinces() -> Vec<RegionRecord> {
        vec![
            boxed(1, "A", None, [100.0, 102.0], [13.0, 15.0]),
            boxed(2, "B", None, [98.0, 99.0], [17.0, 18.0]),
        ]
    }

    pub fn districts() -> Vec<RegionRecord> {
        vec![
            boxed(10, "Mueang", Some(1), [100.0, 101.0], [13.0, 14.0]),
            boxed(20, "Mueang", Some(2), [98.0, 98.5], [17.0, 17.5]),
        ]
    }

    pub fn subdistricts() -> Vec<RegionRecord> {
        vec![
            boxed(100, "Nai Mueang", Some(10), [100.0, 100.5], [13.0, 13.5]),
            boxed(200, "Nai Mueang", Some(20), [98.0, 98.2], [17.0, 17.2]),
        ]
    }

    /// Provinces A and B, each holding one "Mueang" district with one
    /// "Nai Mueang" subdistrict.
    pub fn store() -> RegionStore {
        let mut store = RegionStore::new();
        store.load_tier(RegionLevel::Province, provinces());
        store.load_tier(RegionLevel::District, districts());
        store.load_tier(RegionLevel::Subdistrict, subdistricts());
        store
    }
}
