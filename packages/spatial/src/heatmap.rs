//! Weighted heat layer.

use serde::{Deserialize, Serialize};

use crate::PresentedIncident;

/// Intensity used when an incident has no recorded amount.
pub const UNMEASURED_INTENSITY: f64 = 0.1;

/// One colour stop of the heat gradient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GradientStop {
    /// Position in `[0, 1]`.
    pub stop: f64,
    pub color: String,
}

/// Rendering options handed to the heat renderer unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeatmapOptions {
    pub radius: u32,
    pub blur: u32,
    pub max_zoom: u32,
    pub min_opacity: f64,
    pub gradient: Vec<GradientStop>,
}

impl Default for HeatmapOptions {
    fn default() -> Self {
        let gradient = [
            (0.0, "#00FFFF"),
            (0.2, "#00FF00"),
            (0.4, "#FFFF00"),
            (0.6, "#FFA500"),
            (0.8, "#FF0000"),
            (1.0, "#800080"),
        ]
        .into_iter()
        .map(|(stop, color)| GradientStop {
            stop,
            color: color.to_string(),
        })
        .collect();

        Self {
            radius: 25,
            blur: 15,
            max_zoom: 15,
            min_opacity: 0.4,
            gradient,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatPoint {
    pub lat: f64,
    pub lng: f64,
    pub intensity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapLayer {
    pub points: Vec<HeatPoint>,
    pub options: HeatmapOptions,
}

/// Heat intensity of an amount: `clamp(log10(amount + 1) / 3, 0, 1) * 0.8`.
///
/// Negative amounts count as zero; a missing amount gets
/// [`UNMEASURED_INTENSITY`].
#[must_use]
pub fn intensity(amount: Option<f64>) -> f64 {
    amount.map_or(UNMEASURED_INTENSITY, |amount| {
        ((amount.max(0.0) + 1.0).log10() / 3.0).clamp(0.0, 1.0) * 0.8
    })
}

#[derive(Debug, Clone, Default)]
pub struct HeatmapPresenter {
    options: HeatmapOptions,
}

impl HeatmapPresenter {
    #[must_use]
    pub const fn new(options: HeatmapOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn present(&self, points: &[PresentedIncident<'_>]) -> HeatmapLayer {
        HeatmapLayer {
            points: points
                .iter()
                .map(|p| HeatPoint {
                    lat: p.lat,
                    lng: p.lng,
                    intensity: intensity(p.incident.finite_amount()),
                })
                .collect(),
            options: self.options.clone(),
        }
    }
}
