#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Viewport state for the vector map.
//!
//! The visible world rectangle is derived, never stored: it is recomputed
//! from the fit target's bounds, the zoom level and the pan offset every
//! time it is needed. Gestures only touch zoom and pan.

pub mod gesture;

use std::fmt;

use evidence_map_projection::WorldBounds;
use evidence_map_region_models::RegionLevel;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Tunables for zooming, panning and fitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewportConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Fraction of the view box moved per client pixel of drag.
    pub drag_scale: f64,
    /// Zoom change per wheel delta unit.
    pub wheel_sensitivity: f64,
    /// Largest zoom change a single wheel event may cause.
    pub max_wheel_step: f64,
    /// Multiplier used by the zoom buttons.
    pub button_zoom_step: f64,
    /// Smallest padded extent, in world units, before zoom is applied.
    pub min_extent: f64,
    pub padding: TierPadding,
    /// Fallback bounds when there is nothing valid to fit.
    pub default_bounds: WorldBounds,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.5,
            max_zoom: 10.0,
            drag_scale: 0.005,
            wheel_sensitivity: 0.01,
            max_wheel_step: 0.1,
            button_zoom_step: 1.2,
            min_extent: 0.1,
            padding: TierPadding::default(),
            default_bounds: WorldBounds {
                min_x: 97.0,
                min_y: -21.0,
                max_x: 106.0,
                max_y: -5.0,
            },
        }
    }
}

/// Padding added on every side of the fitted bounds, per tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TierPadding {
    pub subdistrict: f64,
    pub district: f64,
    pub province: f64,
    pub whole_map: f64,
}

impl Default for TierPadding {
    fn default() -> Self {
        Self {
            subdistrict: 0.02,
            district: 0.05,
            province: 0.1,
            whole_map: 0.5,
        }
    }
}

impl TierPadding {
    #[must_use]
    pub const fn for_tier(&self, tier: FitTier) -> f64 {
        match tier {
            FitTier::Subdistrict => self.subdistrict,
            FitTier::District => self.district,
            FitTier::Province => self.province,
            FitTier::WholeMap => self.whole_map,
        }
    }
}

/// What the viewport is fitted to, most specific first.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FitTier {
    /// Selected subdistricts.
    Subdistrict,
    /// Selected districts.
    District,
    /// Selected provinces.
    Province,
    /// Every loaded province.
    WholeMap,
}

impl FitTier {
    /// Tiers in the order they are considered.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Subdistrict, Self::District, Self::Province, Self::WholeMap]
    }

    /// The tier fitting selected regions of `level`.
    #[must_use]
    pub const fn for_level(level: RegionLevel) -> Self {
        match level {
            RegionLevel::Province => Self::Province,
            RegionLevel::District => Self::District,
            RegionLevel::Subdistrict => Self::Subdistrict,
        }
    }

    /// The region level whose geometries are fitted. The whole map fits
    /// every province.
    #[must_use]
    pub const fn level(self) -> RegionLevel {
        match self {
            Self::Subdistrict => RegionLevel::Subdistrict,
            Self::District => RegionLevel::District,
            Self::Province | Self::WholeMap => RegionLevel::Province,
        }
    }
}

/// The rendered world-coordinate window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl fmt::Display for ViewBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.min_x, self.min_y, self.width, self.height)
    }
}

/// Pan offset in world units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PanOffset {
    pub x: f64,
    pub y: f64,
}

/// Position inside the rendered element as a fraction of its size,
/// `(0, 0)` being the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelativePoint {
    pub x: f64,
    pub y: f64,
}

impl RelativePoint {
    /// The element centre.
    pub const CENTER: Self = Self { x: 0.5, y: 0.5 };
}

/// Zoom and pan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportState {
    pub zoom_level: f64,
    pub pan_offset: PanOffset,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            zoom_level: 1.0,
            pan_offset: PanOffset::default(),
        }
    }
}

/// Owns one map's viewport state.
#[derive(Debug, Clone, Default)]
pub struct ViewportController {
    config: ViewportConfig,
    state: ViewportState,
}

impl ViewportController {
    #[must_use]
    pub fn new(config: ViewportConfig) -> Self {
        Self {
            config,
            state: ViewportState::default(),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ViewportConfig {
        &self.config
    }

    #[must_use]
    pub const fn state(&self) -> ViewportState {
        self.state
    }

    #[must_use]
    pub const fn zoom_level(&self) -> f64 {
        self.state.zoom_level
    }

    #[must_use]
    pub const fn pan_offset(&self) -> PanOffset {
        self.state.pan_offset
    }

    /// Replaces the state wholesale, e.g. to roll back an aborted gesture.
    pub const fn restore(&mut self, state: ViewportState) {
        self.state = state;
    }

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.config.min_zoom, self.config.max_zoom)
    }

    /// Computes the view box for `tier` given the bounds of its geometries.
    ///
    /// Missing or zero-area bounds fall back to the configured default
    /// bounds with whole-map padding.
    #[must_use]
    pub fn compute_view_box(&self, tier: FitTier, bounds: Option<WorldBounds>) -> ViewBox {
        let (bounds, padding) = match bounds.filter(|b| !b.is_degenerate()) {
            Some(bounds) => (bounds, self.config.padding.for_tier(tier)),
            None => {
                log::debug!("No usable {tier} bounds, fitting default map bounds");
                (self.config.default_bounds, self.config.padding.whole_map)
            }
        };

        let zoom = self.state.zoom_level;
        let width = (bounds.width() + padding * 2.0).max(self.config.min_extent) / zoom;
        let height = (bounds.height() + padding * 2.0).max(self.config.min_extent) / zoom;
        let center = bounds.center();

        ViewBox {
            min_x: center.x - width / 2.0 + self.state.pan_offset.x,
            min_y: center.y - height / 2.0 + self.state.pan_offset.y,
            width,
            height,
        }
    }

    /// Multiplies the zoom by `factor`, keeping the area under `pointer`
    /// in place. `view_box` is the box currently rendered.
    ///
    /// Returns `false` (and changes nothing) when the clamped zoom is
    /// unchanged or the factor is not a positive finite number.
    pub fn zoom_at(&mut self, view_box: &ViewBox, pointer: RelativePoint, factor: f64) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        let previous = self.state.zoom_level;
        let zoom = self.clamp_zoom(previous * factor);
        if (zoom - previous).abs() <= f64::EPSILON * previous {
            return false;
        }

        let local_factor = zoom / previous;
        let shift = 1.0 - 1.0 / local_factor;
        self.state.pan_offset.x += view_box.width * shift * pointer.x * 0.5;
        self.state.pan_offset.y += view_box.height * shift * pointer.y * 0.5;
        self.state.zoom_level = zoom;
        log::trace!("zoom {previous} -> {zoom}");
        true
    }

    /// Maps a raw wheel delta to a bounded zoom factor.
    ///
    /// Scrolling up (negative delta) zooms in. The step never exceeds
    /// `max_wheel_step` in either direction.
    #[must_use]
    pub fn wheel_factor(&self, delta_y: f64) -> f64 {
        if !delta_y.is_finite() || delta_y == 0.0 {
            return 1.0;
        }
        let step = (delta_y.abs() * self.config.wheel_sensitivity).min(self.config.max_wheel_step);
        1.0 - delta_y.signum() * step
    }

    /// Applies one wheel event anchored at `pointer`.
    pub fn wheel(&mut self, view_box: &ViewBox, pointer: RelativePoint, delta_y: f64) -> bool {
        let factor = self.wheel_factor(delta_y);
        self.zoom_at(view_box, pointer, factor)
    }

    /// Zoom-in button: pan is left untouched.
    pub fn zoom_in(&mut self) {
        self.state.zoom_level = self.clamp_zoom(self.state.zoom_level * self.config.button_zoom_step);
    }

    /// Zoom-out button: pan is left untouched.
    pub fn zoom_out(&mut self) {
        self.state.zoom_level = self.clamp_zoom(self.state.zoom_level / self.config.button_zoom_step);
    }

    /// Moves the view by a client-pixel delta.
    ///
    /// Dragging right moves the content right, i.e. the view box left.
    pub fn pan_by(&mut self, view_box: &ViewBox, client_dx: f64, client_dy: f64) {
        if !(client_dx.is_finite() && client_dy.is_finite()) {
            return;
        }
        self.state.pan_offset.x -= view_box.width * self.config.drag_scale * client_dx;
        self.state.pan_offset.y -= view_box.height * self.config.drag_scale * client_dy;
    }

    /// Back to zoom 1 with no pan.
    pub fn reset(&mut self) {
        self.state = ViewportState::default();
    }

    /// Same as [`Self::reset`]; the fitted bounds follow the selection.
    pub fn fit_to_view(&mut self) {
        self.reset();
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    pub const EPSILON: f64 = 1e-9;

    pub fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }
}
