//! Reactive fitting of the tiled renderer to the selection.

use evidence_map_projection::WorldBounds;
use evidence_map_region::RegionStore;
use evidence_map_region_models::RegionLevel;
use evidence_map_selection::{SelectionSet, VisibleLevels};
use geo::{Point, Rect, coord};

use crate::config::TileViewConfig;

/// Camera instruction for the tiled renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TileFit {
    /// Nothing selected: show the default view.
    Default { center: Point<f64>, zoom: f64 },
    /// Fit these lng/lat bounds.
    Bounds {
        rect: Rect<f64>,
        padding_px: u32,
        max_zoom: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FitKey {
    selection: SelectionSet,
    visible: VisibleLevels,
    revisions: [u64; 3],
}

/// Emits a [`TileFit`] whenever the selection, the visible tiers or the
/// loaded geometry change, and stays quiet otherwise.
#[derive(Debug, Clone, Default)]
pub struct MapBoundsAdjuster {
    config: TileViewConfig,
    last: Option<FitKey>,
}

impl MapBoundsAdjuster {
    #[must_use]
    pub const fn new(config: TileViewConfig) -> Self {
        Self { config, last: None }
    }

    /// The fit for the current state, ignoring whether it changed.
    ///
    /// The finest selected tier that is also visible is fitted, falling
    /// back to selected provinces. Returns `None` when the chosen regions
    /// have no usable geometry.
    #[must_use]
    pub fn compute(
        &self,
        selection: &SelectionSet,
        visible: VisibleLevels,
        store: &RegionStore,
    ) -> Option<TileFit> {
        if selection.is_empty() {
            let [lat, lng] = self.config.default_center;
            return Some(TileFit::Default {
                center: Point::new(lng, lat),
                zoom: self.config.default_zoom,
            });
        }

        let level = [RegionLevel::Subdistrict, RegionLevel::District]
            .into_iter()
            .find(|level| visible.is_visible(*level) && !selection.tier(*level).is_empty())
            .unwrap_or(RegionLevel::Province);

        let geometries = selection
            .tier(level)
            .iter()
            .filter_map(|id| store.get(level, *id))
            .map(|region| &region.geometry);
        let Some(bounds) = WorldBounds::from_geometries(geometries) else {
            log::debug!("Selected {level} regions have no geometry to fit");
            return None;
        };

        Some(TileFit::Bounds {
            rect: world_to_lng_lat(bounds),
            padding_px: self.config.fit_padding_px,
            max_zoom: self.config.fit_max_zoom,
        })
    }

    /// Like [`Self::compute`], but only when an input changed since the
    /// previous call.
    pub fn adjust(
        &mut self,
        selection: &SelectionSet,
        visible: VisibleLevels,
        store: &RegionStore,
    ) -> Option<TileFit> {
        let key = FitKey {
            selection: selection.clone(),
            visible,
            revisions: [
                store.revision(RegionLevel::Province),
                store.revision(RegionLevel::District),
                store.revision(RegionLevel::Subdistrict),
            ],
        };
        if self.last.as_ref() == Some(&key) {
            return None;
        }
        self.last = Some(key);
        self.compute(selection, visible, store)
    }
}

fn world_to_lng_lat(bounds: WorldBounds) -> Rect<f64> {
    Rect::new(
        coord! { x: bounds.min_x, y: -bounds.max_y },
        coord! { x: bounds.max_x, y: -bounds.min_y },
    )
}
