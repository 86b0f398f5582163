//! Map configuration loaded from TOML.
//!
//! Every key is optional; a missing key keeps its default and an unknown
//! key is an error.

use std::path::Path;

use evidence_map_aggregation::Palette;
use evidence_map_spatial::{ClusterConfig, HeatmapOptions};
use evidence_map_viewport::ViewportConfig;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Settings for the tiled geographic renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TileViewConfig {
    /// `[lat, lng]` shown when nothing is selected.
    pub default_center: [f64; 2],
    pub default_zoom: f64,
    /// Pixels kept clear around fitted bounds.
    pub fit_padding_px: u32,
    /// Fitting never zooms in further than this.
    pub fit_max_zoom: f64,
}

impl Default for TileViewConfig {
    fn default() -> Self {
        Self {
            default_center: [13.7563, 100.5018],
            default_zoom: 6.0,
            fit_padding_px: 50,
            fit_max_zoom: 13.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapConfig {
    pub viewport: ViewportConfig,
    pub palette: Palette,
    pub heatmap: HeatmapOptions,
    pub cluster: ClusterConfig,
    pub tile_view: TileViewConfig,
}

impl MapConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// * If the document is not valid TOML or has unknown keys
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// * If the file cannot be read
    /// * If the file is not a valid configuration
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        log::debug!("Loading map config from {}", path.display());
        let toml_str = std::fs::read_to_string(path)?;
        Self::from_toml_str(&toml_str)
    }
}
