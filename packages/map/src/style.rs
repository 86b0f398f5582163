//! Per-feature styling for region layers.
//!
//! Styles are pure functions of tier, selection and aggregated amount, so
//! both renderers draw a region identically.

use evidence_map_aggregation::Palette;
use evidence_map_region_models::RegionLevel;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureStyle {
    /// Stroke colour.
    pub color: String,
    pub weight: f64,
    pub opacity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash_array: Option<String>,
    pub fill_color: String,
    pub fill_opacity: f64,
}

struct LevelLook {
    stroke: &'static str,
    selected_stroke: &'static str,
    weight: f64,
    fill_opacity: f64,
    selected_fill_opacity: f64,
    dashed: bool,
}

const fn look(level: RegionLevel) -> LevelLook {
    match level {
        RegionLevel::Province => LevelLook {
            stroke: "#555",
            selected_stroke: "#2563eb",
            weight: 1.0,
            fill_opacity: 0.45,
            selected_fill_opacity: 0.65,
            dashed: false,
        },
        RegionLevel::District => LevelLook {
            stroke: "#888",
            selected_stroke: "#dd6b20",
            weight: 1.5,
            fill_opacity: 0.55,
            selected_fill_opacity: 0.7,
            dashed: true,
        },
        RegionLevel::Subdistrict => LevelLook {
            stroke: "#aaa",
            selected_stroke: "#38a169",
            weight: 1.0,
            fill_opacity: 0.55,
            selected_fill_opacity: 0.7,
            dashed: true,
        },
    }
}

const SELECTED_WEIGHT: f64 = 2.5;
const HOVER_WEIGHT: f64 = 2.0;
const HOVER_FILL_OPACITY: f64 = 0.7;

/// Resting style of a region.
#[must_use]
pub fn feature_style(level: RegionLevel, selected: bool, amount: f64, palette: &Palette) -> FeatureStyle {
    let look = look(level);
    FeatureStyle {
        color: if selected { look.selected_stroke } else { look.stroke }.to_string(),
        weight: if selected { SELECTED_WEIGHT } else { look.weight },
        opacity: 1.0,
        dash_array: (look.dashed && !selected).then(|| "3".to_string()),
        fill_color: palette.color_for(amount).to_string(),
        fill_opacity: if selected {
            look.selected_fill_opacity
        } else {
            look.fill_opacity
        },
    }
}

/// Transient highlight while the pointer is over a region.
#[must_use]
pub fn hover_style(level: RegionLevel, amount: f64, palette: &Palette) -> FeatureStyle {
    FeatureStyle {
        color: look(level).selected_stroke.to_string(),
        weight: HOVER_WEIGHT,
        opacity: 1.0,
        dash_array: None,
        fill_color: palette.color_for(amount).to_string(),
        fill_opacity: HOVER_FILL_OPACITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_changes_stroke_weight_and_dash() {
        let palette = Palette::default();
        let resting = feature_style(RegionLevel::District, false, 150.0, &palette);
        assert_eq!(resting.color, "#888");
        assert_eq!(resting.dash_array.as_deref(), Some("3"));
        assert_eq!(resting.fill_color, "#b3e0ff");

        let selected = feature_style(RegionLevel::District, true, 150.0, &palette);
        assert_eq!(selected.color, "#dd6b20");
        assert_eq!(selected.dash_array, None);
        assert!((selected.weight - 2.5).abs() < f64::EPSILON);
        assert!((selected.fill_opacity - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn provinces_are_never_dashed() {
        let palette = Palette::default();
        assert_eq!(feature_style(RegionLevel::Province, false, 0.0, &palette).dash_array, None);
    }

    #[test]
    fn hover_uses_level_highlight() {
        let style = hover_style(RegionLevel::Subdistrict, 0.0, &Palette::default());
        assert_eq!(style.color, "#38a169");
        assert!((style.weight - 2.0).abs() < f64::EPSILON);
        assert!((style.fill_opacity - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn style_serializes_in_renderer_casing() {
        let style = feature_style(RegionLevel::Province, true, 0.0, &Palette::default());
        let json = serde_json::to_value(&style).unwrap();
        assert_eq!(json["fillColor"], "#e6f7ff");
        assert!(json.get("dashArray").is_none());
    }
}
