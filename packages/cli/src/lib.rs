#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Loading and rendering helpers behind the `evidence_map` binary.

pub mod svg;

use std::path::PathBuf;

use evidence_map::{ConfigError, MapConfig, MapError, MapInstance};
use evidence_map_incident_models::{FilterState, MainCategory};
use evidence_map_region::provider::JsonFileProvider;
use evidence_map_region_models::{RegionId, RegionLevel};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Map error: {0}")]
    Map(#[from] MapError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No provinces could be loaded from {path}")]
    NoProvinces { path: String },
}

/// Inputs and initial state for a map built from files.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub provinces: PathBuf,
    pub districts: Option<PathBuf>,
    pub subdistricts: Option<PathBuf>,
    pub incidents: Option<PathBuf>,
    pub config: Option<PathBuf>,
    /// Regions to select, applied coarsest tier first.
    pub select: Vec<(RegionLevel, RegionId)>,
    pub filters: FilterState,
}

/// Default filters with `main` applied and the `disabled` subtype keys
/// switched off.
#[must_use]
pub fn filters(main: MainCategory, disabled: &[String]) -> FilterState {
    let mut filters = FilterState {
        active_main_category: main,
        ..FilterState::default()
    };
    for key in disabled {
        filters.set(key, false);
    }
    filters
}

/// Builds a map from boundary and incident files.
///
/// Selections are applied one tier at a time so each tier's geometry is
/// loaded before its children are selected.
///
/// # Errors
///
/// * If the config file cannot be read or parsed
/// * If no province could be loaded
/// * If the incident file cannot be read or is not a JSON incident array
pub async fn load_map(options: &LoadOptions) -> Result<MapInstance, CliError> {
    let config = match &options.config {
        Some(path) => MapConfig::load(path)?,
        None => MapConfig::default(),
    };
    let mut map = MapInstance::new(config);

    let mut provider = JsonFileProvider::new(options.provinces.clone());
    if let Some(path) = &options.districts {
        provider = provider.with_districts(path.clone());
    }
    if let Some(path) = &options.subdistricts {
        provider = provider.with_subdistricts(path.clone());
    }

    map.refresh_geometry(&provider).await;
    if !map.store().is_loaded(RegionLevel::Province) {
        return Err(CliError::NoProvinces {
            path: options.provinces.display().to_string(),
        });
    }

    for level in RegionLevel::all() {
        for (_, id) in options.select.iter().filter(|(l, _)| l == level) {
            map.select(*level, *id);
        }
        map.refresh_geometry(&provider).await;
    }

    if let Some(path) = &options.incidents {
        let body = tokio::fs::read_to_string(path).await?;
        let count = map.set_incidents_json(&body)?;
        log::info!(
            "Loaded {count} incidents from {} ({} excluded)",
            path.display(),
            map.incidents().diagnostics().len()
        );
    }

    map.set_filters(options.filters.clone());
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &std::path::Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("evidence_map_cli_{name}_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    const PROVINCES: &str = r#"[
        {"id": 1, "name": "A", "geometry": {"type": "Polygon", "coordinates": [[[100, 13], [101, 13], [101, 14], [100, 13]]]}}
    ]"#;

    const DISTRICTS: &str = r#"[
        {"id": 10, "name": "Mueang", "province_id": 1, "geometry": {"type": "Polygon", "coordinates": [[[100, 13], [100.5, 13], [100.5, 13.5], [100, 13]]]}}
    ]"#;

    #[test]
    fn filters_switch_off_disabled_keys() {
        let filters = filters(MainCategory::Drugs, &["meth".to_string()]);
        assert_eq!(filters.active_main_category, MainCategory::Drugs);
        assert_eq!(filters.subtype_toggles.get("meth"), Some(&false));
        assert_eq!(filters.subtype_toggles.get("heroin"), Some(&true));
    }

    #[tokio::test]
    async fn loads_selected_tiers_and_incidents() {
        let dir = temp_dir("load");
        let options = LoadOptions {
            provinces: write(&dir, "provinces.json", PROVINCES),
            districts: Some(write(&dir, "districts.json", DISTRICTS)),
            incidents: Some(write(
                &dir,
                "incidents.json",
                r#"[{"id": 1, "category": "firearm", "amount": 3, "lat": 13.2, "lng": 100.2, "province_name": "A"}]"#,
            )),
            select: vec![(RegionLevel::Province, RegionId(1))],
            ..LoadOptions::default()
        };

        let mut map = load_map(&options).await.unwrap();
        assert_eq!(map.store().len(RegionLevel::District), 1);
        assert_eq!(map.totals(RegionLevel::Province)[&RegionId(1)], 3.0);
    }

    #[tokio::test]
    async fn missing_provinces_file_is_an_error() {
        let options = LoadOptions {
            provinces: PathBuf::from("/nonexistent/provinces.json"),
            ..LoadOptions::default()
        };
        assert!(matches!(
            load_map(&options).await,
            Err(CliError::NoProvinces { .. })
        ));
    }
}
