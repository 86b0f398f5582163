//! One map's complete state and the operations renderers call into.

use std::collections::BTreeMap;
use std::sync::Arc;

use evidence_map_aggregation::{AggregationCache, AggregationResult};
use evidence_map_incident_models::{
    FilterState, Incident, IncidentDiagnostic, IncidentSet, MainCategory,
};
use evidence_map_projection::{PathData, WorldBounds, project_geometry};
use evidence_map_region::search::{ProvinceNode, search};
use evidence_map_region::{LoadReport, RegionStore};
use evidence_map_region_models::{RegionId, RegionLevel, RegionRecord};
use evidence_map_selection::{SelectionListener, SelectionModel, SelectionSet, VisibleLevels};
use evidence_map_spatial::{
    ClusterPresenter, HeatmapPresenter, SpatialLayer, SpatialPresenter, ViewMode,
};
use evidence_map_viewport::gesture::{ElementRect, GestureSession, PointerButton, ScreenPoint};
use evidence_map_viewport::{FitTier, RelativePoint, ViewBox, ViewportController, ViewportState};
use serde::Serialize;
use serde_json::json;

use crate::bounds::{MapBoundsAdjuster, TileFit};
use crate::config::MapConfig;
use crate::style::{FeatureStyle, feature_style, hover_style};
use crate::MapError;

/// Pointer interaction with one region feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureEvent {
    Click,
    Hover,
    MouseOut,
}

/// A region ready for the vector renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorFeature {
    pub id: RegionId,
    pub level: RegionLevel,
    pub name: String,
    pub amount: f64,
    pub path: PathData,
    pub style: FeatureStyle,
}

/// Everything one map owns. Independent instances share nothing.
#[derive(Debug)]
pub struct MapInstance {
    config: MapConfig,
    pub(crate) store: RegionStore,
    incidents: IncidentSet,
    incident_revision: u64,
    filters: FilterState,
    pub(crate) selection: SelectionModel,
    viewport: ViewportController,
    gesture: GestureSession,
    aggregation: AggregationCache,
    bounds: MapBoundsAdjuster,
    presenter: SpatialPresenter,
    hovered: Option<(RegionLevel, RegionId)>,
    /// Parent ids and resulting store revision of the last fetch per tier.
    pub(crate) fetched: BTreeMap<RegionLevel, (Vec<RegionId>, u64)>,
}

impl Default for MapInstance {
    fn default() -> Self {
        Self::new(MapConfig::default())
    }
}

impl MapInstance {
    #[must_use]
    pub fn new(config: MapConfig) -> Self {
        let presenter = build_presenter(&config, ViewMode::default());
        Self {
            viewport: ViewportController::new(config.viewport.clone()),
            bounds: MapBoundsAdjuster::new(config.tile_view),
            presenter,
            config,
            store: RegionStore::new(),
            incidents: IncidentSet::default(),
            incident_revision: 0,
            filters: FilterState::default(),
            selection: SelectionModel::new(),
            gesture: GestureSession::default(),
            aggregation: AggregationCache::new(),
            hovered: None,
            fetched: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &MapConfig {
        &self.config
    }

    // Geometry

    #[must_use]
    pub const fn store(&self) -> &RegionStore {
        &self.store
    }

    /// Loads one tier directly, bypassing any provider.
    pub fn load_tier(&mut self, level: RegionLevel, records: Vec<RegionRecord>) -> LoadReport {
        self.fetched.remove(&level);
        self.store.load_tier(level, records)
    }

    /// Region picker tree filtered by `term`.
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<ProvinceNode<'_>> {
        search(&self.store, term)
    }

    // Incidents and filters

    /// Replaces the incident feed. Returns the incidents that were excluded.
    pub fn set_incidents(&mut self, feed: Vec<Incident>) -> &[IncidentDiagnostic] {
        self.incidents = IncidentSet::new(feed);
        self.incident_revision += 1;
        self.incidents.diagnostics()
    }

    /// Replaces the incident feed from a JSON array.
    ///
    /// # Errors
    ///
    /// * If `body` is not a JSON array of incidents
    pub fn set_incidents_json(&mut self, body: &str) -> Result<usize, MapError> {
        let feed: Vec<Incident> = serde_json::from_str(body)?;
        self.set_incidents(feed);
        Ok(self.incidents.len())
    }

    #[must_use]
    pub const fn incidents(&self) -> &IncidentSet {
        &self.incidents
    }

    #[must_use]
    pub const fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn set_filters(&mut self, filters: FilterState) {
        self.filters = filters;
    }

    pub fn toggle_subtype(&mut self, key: &str) {
        self.filters.toggle(key);
    }

    pub const fn set_main_category(&mut self, category: MainCategory) {
        self.filters.active_main_category = category;
    }

    // Aggregation

    /// Per-region totals of `level`, recomputed only when an input changed.
    pub fn totals(&mut self, level: RegionLevel) -> &AggregationResult {
        self.aggregation.totals(
            self.incidents.incidents(),
            self.incident_revision,
            &self.filters,
            &self.store,
            level,
        )
    }

    #[must_use]
    pub const fn aggregation(&self) -> &AggregationCache {
        &self.aggregation
    }

    // Selection

    #[must_use]
    pub const fn selection(&self) -> &SelectionSet {
        self.selection.selection()
    }

    #[must_use]
    pub const fn visible_levels(&self) -> VisibleLevels {
        self.selection.visible_levels()
    }

    pub fn add_selection_listener(&mut self, listener: Arc<dyn SelectionListener>) {
        self.selection.add_listener(listener);
    }

    pub fn toggle(&mut self, level: RegionLevel, id: RegionId) {
        self.selection.toggle(&self.store, level, id);
    }

    /// Selects `id` (and its ancestors) without toggling.
    pub fn select(&mut self, level: RegionLevel, id: RegionId) {
        self.selection.select(&self.store, level, id);
    }

    pub fn clear_selection(&mut self, level: RegionLevel) {
        self.selection.clear(level);
    }

    pub const fn toggle_visible_level(&mut self, level: RegionLevel) {
        self.selection.toggle_visible_level(level);
    }

    pub fn show_selected_levels(&mut self) {
        self.selection.show_selected_levels();
    }

    // Viewport

    #[must_use]
    pub const fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    /// The tier the vector view is fitted to and the bounds of its
    /// geometry: the finest selected tier whose selected regions have
    /// usable geometry, or every province.
    #[must_use]
    pub fn fit_target(&self) -> (FitTier, Option<WorldBounds>) {
        let selection = self.selection.selection();
        let selected = [
            RegionLevel::Subdistrict,
            RegionLevel::District,
            RegionLevel::Province,
        ]
        .into_iter()
        .filter(|level| !selection.tier(*level).is_empty())
        .find_map(|level| {
            let geometries = selection
                .tier(level)
                .iter()
                .filter_map(|id| self.store.get(level, *id))
                .map(|region| &region.geometry);
            WorldBounds::from_geometries(geometries)
                .filter(|bounds| !bounds.is_degenerate())
                .map(|bounds| (FitTier::for_level(level), Some(bounds)))
        });

        selected.unwrap_or_else(|| {
            (
                FitTier::WholeMap,
                WorldBounds::from_geometries(
                    self.store
                        .regions(RegionLevel::Province)
                        .map(|region| &region.geometry),
                ),
            )
        })
    }

    /// Replaces zoom and pan, e.g. to restore a saved view.
    pub fn restore_viewport(&mut self, state: ViewportState) {
        self.gesture.cancel(&mut self.viewport);
        self.viewport.restore(state);
    }

    #[must_use]
    pub fn view_box(&self) -> ViewBox {
        let (tier, bounds) = self.fit_target();
        self.viewport.compute_view_box(tier, bounds)
    }

    pub fn wheel(&mut self, pointer: RelativePoint, delta_y: f64) -> bool {
        let view_box = self.view_box();
        let changed = self.viewport.wheel(&view_box, pointer, delta_y);
        self.gesture.rebase(&self.viewport);
        changed
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
        self.gesture.rebase(&self.viewport);
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
        self.gesture.rebase(&self.viewport);
    }

    pub fn reset_view(&mut self) {
        self.gesture.cancel(&mut self.viewport);
        self.viewport.reset();
    }

    pub fn fit_to_view(&mut self) {
        self.gesture.cancel(&mut self.viewport);
        self.viewport.fit_to_view();
    }

    pub fn pointer_down(&mut self, button: PointerButton, at: ScreenPoint) -> bool {
        self.gesture.press(&self.viewport, button, at)
    }

    pub fn pointer_move(&mut self, at: ScreenPoint) -> bool {
        let view_box = self.view_box();
        self.gesture.pointer_move(&mut self.viewport, &view_box, at)
    }

    pub fn pointer_up(&mut self) {
        self.gesture.release();
    }

    /// The pointer left the map mid-gesture: the gesture is undone.
    pub fn pointer_leave(&mut self) {
        self.gesture.cancel(&mut self.viewport);
    }

    pub fn touch_start(&mut self, touches: &[ScreenPoint]) {
        self.gesture.touch_start(&mut self.viewport, touches);
    }

    pub fn touch_move(&mut self, element: &ElementRect, touches: &[ScreenPoint]) -> bool {
        let view_box = self.view_box();
        self.gesture
            .touch_move(&mut self.viewport, &view_box, element, touches)
    }

    pub fn touch_end(&mut self, remaining: usize) {
        self.gesture.touch_end(remaining);
    }

    pub fn touch_cancel(&mut self) {
        self.gesture.cancel(&mut self.viewport);
    }

    // Region features

    /// Every drawable region of `level`, styled. Hidden tiers and regions
    /// whose geometry projects to nothing are left out.
    pub fn vector_features(&mut self, level: RegionLevel) -> Vec<VectorFeature> {
        if !self.selection.visible_levels().is_visible(level) {
            return Vec::new();
        }
        let totals = self.aggregation.totals(
            self.incidents.incidents(),
            self.incident_revision,
            &self.filters,
            &self.store,
            level,
        );

        self.store
            .regions(level)
            .filter_map(|region| {
                let path = project_geometry(&region.geometry);
                if path.is_empty() {
                    return None;
                }
                let amount = totals.get(&region.id).copied().unwrap_or(0.0);
                let style = if self.hovered == Some((level, region.id)) {
                    hover_style(level, amount, &self.config.palette)
                } else {
                    feature_style(
                        level,
                        self.selection.is_selected(level, region.id),
                        amount,
                        &self.config.palette,
                    )
                };
                Some(VectorFeature {
                    id: region.id,
                    level,
                    name: region.name.clone(),
                    amount,
                    path,
                    style,
                })
            })
            .collect()
    }

    /// Resting style of one region.
    pub fn region_style(&mut self, level: RegionLevel, id: RegionId) -> FeatureStyle {
        let amount = self.totals(level).get(&id).copied().unwrap_or(0.0);
        feature_style(
            level,
            self.selection.is_selected(level, id),
            amount,
            &self.config.palette,
        )
    }

    /// Applies a pointer event on a region and returns the style the
    /// feature should now have. Unknown regions are ignored.
    pub fn handle_feature_event(
        &mut self,
        level: RegionLevel,
        id: RegionId,
        event: FeatureEvent,
    ) -> Option<FeatureStyle> {
        self.store.get(level, id)?;
        match event {
            FeatureEvent::Click => {
                self.selection.toggle(&self.store, level, id);
                Some(self.region_style(level, id))
            }
            FeatureEvent::Hover => {
                self.hovered = Some((level, id));
                let amount = self.totals(level).get(&id).copied().unwrap_or(0.0);
                Some(hover_style(level, amount, &self.config.palette))
            }
            FeatureEvent::MouseOut => {
                if self.hovered == Some((level, id)) {
                    self.hovered = None;
                }
                Some(self.region_style(level, id))
            }
        }
    }

    /// Regions of `level` as `GeoJSON` for the tiled renderer, each with
    /// its id, name, total and style as properties.
    pub fn tile_features(&mut self, level: RegionLevel) -> geojson::FeatureCollection {
        let features = self
            .vector_features(level)
            .into_iter()
            .filter_map(|feature| {
                let region = self.store.get(level, feature.id)?;
                let properties = json!({
                    "id": feature.id,
                    "level": level,
                    "name": feature.name,
                    "amount": feature.amount,
                    "style": feature.style,
                });
                Some(geojson::Feature {
                    bbox: None,
                    geometry: Some(region.geometry.to_geojson()),
                    id: Some(geojson::feature::Id::Number(feature.id.0.into())),
                    properties: properties.as_object().cloned(),
                    foreign_members: None,
                })
            })
            .collect();

        geojson::FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }

    /// Camera update for the tiled renderer, if the fit inputs changed.
    pub fn tile_fit(&mut self) -> Option<TileFit> {
        self.bounds.adjust(
            self.selection.selection(),
            self.selection.visible_levels(),
            &self.store,
        )
    }

    // Point layers

    #[must_use]
    pub const fn view_mode(&self) -> ViewMode {
        self.presenter.mode()
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if self.presenter.mode() != mode {
            log::debug!("Switching point layer to {mode}");
            self.presenter = build_presenter(&self.config, mode);
        }
    }

    /// The active point layer at tile zoom `zoom`.
    #[must_use]
    pub fn spatial_layer(&self, zoom: f64) -> SpatialLayer {
        self.presenter
            .present(self.incidents.incidents(), &self.filters, zoom)
    }
}

fn build_presenter(config: &MapConfig, mode: ViewMode) -> SpatialPresenter {
    SpatialPresenter::for_mode(
        mode,
        ClusterPresenter::new(config.cluster, config.palette.clone()),
        HeatmapPresenter::new(config.heatmap.clone()),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use evidence_map_incident_models::IncidentCategory;
    use evidence_map_viewport::gesture::GesturePhase;

    use super::*;
    use crate::test_support::{districts, provinces, subdistricts};

    fn incident(id: i64, subtype: Option<&str>, amount: f64, province: &str) -> Incident {
        Incident {
            id,
            category: if subtype.is_some() {
                IncidentCategory::Drug
            } else {
                IncidentCategory::Firearm
            },
            subtype: subtype.map(ToString::to_string),
            amount: Some(amount),
            lat: Some(13.75),
            lng: Some(100.5),
            province_name: province.to_string(),
            district_name: "Mueang".to_string(),
            subdistrict_name: "Nai Mueang".to_string(),
            date: None,
        }
    }

    fn instance() -> MapInstance {
        let mut map = MapInstance::default();
        map.load_tier(RegionLevel::Province, provinces());
        map.load_tier(RegionLevel::District, districts());
        map.load_tier(RegionLevel::Subdistrict, subdistricts());
        map
    }

    #[derive(Default)]
    struct Sidebar(Mutex<Vec<SelectionSet>>);

    impl SelectionListener for Sidebar {
        fn selection_changed(&self, selection: &SelectionSet) {
            self.0.lock().unwrap().push(selection.clone());
        }
    }

    #[test]
    fn province_totals_end_to_end() {
        let mut map = instance();
        map.set_incidents(vec![
            incident(1, None, 10.0, "A"),
            incident(2, None, 5.0, "A"),
            incident(3, Some("meth"), 1000.0, "B"),
        ]);
        map.set_filters(FilterState::from_toggles([("gun", true), ("meth", false)]));

        let totals = map.totals(RegionLevel::Province).clone();
        assert_eq!(totals[&RegionId(1)], 15.0);
        assert_eq!(totals[&RegionId(2)], 0.0);
    }

    #[test]
    fn totals_are_memoized_until_an_input_changes() {
        let mut map = instance();
        map.set_incidents(vec![incident(1, None, 10.0, "A")]);
        map.totals(RegionLevel::Province);
        map.totals(RegionLevel::Province);
        assert_eq!(map.aggregation().recomputations(), 1);

        map.toggle_subtype("gun");
        assert_eq!(map.totals(RegionLevel::Province)[&RegionId(1)], 0.0);
        assert_eq!(map.aggregation().recomputations(), 2);
    }

    #[test]
    fn out_of_bounds_incidents_are_reported_and_excluded() {
        let mut map = instance();
        let mut stray = incident(9, None, 50.0, "A");
        stray.lat = Some(40.0);
        let diagnostics = map
            .set_incidents(vec![stray, incident(1, None, 1.0, "A")])
            .to_vec();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(map.totals(RegionLevel::Province)[&RegionId(1)], 1.0);
    }

    #[test]
    fn click_toggles_selection_and_notifies() {
        let mut map = instance();
        let sidebar = Arc::new(Sidebar::default());
        map.add_selection_listener(sidebar.clone());

        let style = map
            .handle_feature_event(RegionLevel::Province, RegionId(1), FeatureEvent::Click)
            .unwrap();
        assert_eq!(style.color, "#2563eb");
        assert!(map.selection().provinces.contains(&RegionId(1)));
        assert!(map.visible_levels().district);
        assert_eq!(sidebar.0.lock().unwrap().len(), 1);

        assert!(map
            .handle_feature_event(RegionLevel::Province, RegionId(77), FeatureEvent::Click)
            .is_none());
        assert_eq!(sidebar.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn hover_highlights_until_mouse_out() {
        let mut map = instance();
        let hover = map
            .handle_feature_event(RegionLevel::Province, RegionId(2), FeatureEvent::Hover)
            .unwrap();
        assert!((hover.weight - 2.0).abs() < f64::EPSILON);

        let features = map.vector_features(RegionLevel::Province);
        let hovered = features.iter().find(|f| f.id == RegionId(2)).unwrap();
        assert_eq!(hovered.style, hover);

        let resting = map
            .handle_feature_event(RegionLevel::Province, RegionId(2), FeatureEvent::MouseOut)
            .unwrap();
        assert_eq!(resting.color, "#555");
        let features = map.vector_features(RegionLevel::Province);
        assert!(features.iter().all(|f| f.style.color == "#555"));
    }

    #[test]
    fn hidden_tiers_produce_no_features() {
        let mut map = instance();
        assert_eq!(map.vector_features(RegionLevel::Province).len(), 2);
        assert!(map.vector_features(RegionLevel::District).is_empty());
        map.toggle_visible_level(RegionLevel::District);
        let features = map.vector_features(RegionLevel::District);
        assert_eq!(features.len(), 2);
        assert!(features[0].path.to_string().starts_with("M 100 -13"));
    }

    #[test]
    fn view_box_follows_selection() {
        let mut map = instance();
        let whole = map.view_box();
        assert!((whole.width - 5.0).abs() < 1e-9, "provinces span 98..102 plus 0.5 padding");

        map.toggle(RegionLevel::Subdistrict, RegionId(100));
        let focused = map.view_box();
        assert!((focused.width - 0.54).abs() < 1e-9);
        assert!((focused.min_x - 99.98).abs() < 1e-9);
    }

    #[test]
    fn view_box_falls_back_to_coarser_tier_without_geometry() {
        let mut map = instance();
        map.toggle(RegionLevel::Subdistrict, RegionId(100));
        assert_eq!(map.fit_target().0, FitTier::Subdistrict);

        map.store.clear_tier(RegionLevel::Subdistrict);
        let (tier, bounds) = map.fit_target();
        assert_eq!(tier, FitTier::District);
        assert!((bounds.unwrap().min_x - 100.0).abs() < 1e-9);

        let view_box = map.view_box();
        assert!((view_box.width - 1.1).abs() < 1e-9, "district 10 plus 0.05 padding");
        assert!((view_box.min_x - 99.95).abs() < 1e-9);
    }

    #[test]
    fn pointer_leave_undoes_drag() {
        let mut map = instance();
        let before = map.viewport().state();
        map.pointer_down(PointerButton::Primary, ScreenPoint::new(0.0, 0.0));
        map.pointer_move(ScreenPoint::new(40.0, 10.0));
        assert_ne!(map.viewport().state(), before);
        map.pointer_leave();
        assert_eq!(map.viewport().state(), before);

        map.pointer_down(PointerButton::Primary, ScreenPoint::new(0.0, 0.0));
        map.pointer_move(ScreenPoint::new(40.0, 10.0));
        map.pointer_up();
        assert_ne!(map.viewport().state(), before);
    }

    #[test]
    fn wheel_during_drag_survives_pointer_leave() {
        let mut map = instance();
        map.pointer_down(PointerButton::Primary, ScreenPoint::new(0.0, 0.0));
        assert!(map.wheel(RelativePoint::CENTER, -100.0));
        let zoomed = map.viewport().state();
        map.pointer_move(ScreenPoint::new(40.0, 10.0));
        assert_ne!(map.viewport().state(), zoomed);
        map.pointer_leave();

        assert_eq!(map.viewport().state(), zoomed);
        assert!((map.viewport().zoom_level() - 1.1).abs() < 1e-9);
        assert!(matches!(map.gesture.phase(), GesturePhase::Idle));
    }

    #[test]
    fn wheel_zooms_at_pointer() {
        let mut map = instance();
        assert!(map.wheel(RelativePoint::CENTER, -100.0));
        assert!((map.viewport().zoom_level() - 1.1).abs() < 1e-9);
        map.fit_to_view();
        assert!((map.viewport().zoom_level() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn pinch_on_instance_goes_through_gesture_session() {
        let mut map = instance();
        let element = ElementRect {
            left: 0.0,
            top: 0.0,
            width: 400.0,
            height: 400.0,
        };
        map.touch_start(&[ScreenPoint::new(100.0, 200.0), ScreenPoint::new(300.0, 200.0)]);
        assert!(map.touch_move(
            &element,
            &[ScreenPoint::new(50.0, 200.0), ScreenPoint::new(350.0, 200.0)]
        ));
        map.touch_cancel();
        assert!((map.viewport().zoom_level() - 1.0).abs() < 1e-9);
        assert!(matches!(map.gesture.phase(), GesturePhase::Idle));
    }

    #[test]
    fn spatial_layer_follows_view_mode() {
        let mut map = instance();
        map.set_incidents(vec![incident(1, None, 5.0, "A"), incident(2, None, 5.0, "A")]);
        assert!(matches!(
            map.spatial_layer(6.0),
            SpatialLayer::Clusters { ref items } if items.len() == 1
        ));

        map.set_view_mode(ViewMode::Heatmap);
        assert_eq!(map.view_mode(), ViewMode::Heatmap);
        let SpatialLayer::Heatmap(layer) = map.spatial_layer(6.0) else {
            panic!("expected heatmap");
        };
        assert_eq!(layer.points.len(), 2);
    }

    #[test]
    fn tile_features_carry_geometry_and_properties() {
        let mut map = instance();
        map.set_incidents(vec![incident(1, None, 150.0, "A")]);
        let collection = map.tile_features(RegionLevel::Province);
        assert_eq!(collection.features.len(), 2);

        let feature = &collection.features[0];
        assert!(feature.geometry.is_some());
        let properties = feature.properties.as_ref().unwrap();
        assert_eq!(properties["name"], "A");
        assert_eq!(properties["amount"], 150.0);
        assert_eq!(properties["style"]["fillColor"], "#b3e0ff");
    }

    #[test]
    fn instances_are_independent() {
        let mut first = instance();
        let second = instance();
        first.toggle(RegionLevel::Province, RegionId(1));
        first.zoom_in();
        assert!(second.selection().is_empty());
        assert!((second.viewport().zoom_level() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn incidents_load_from_json() {
        let mut map = instance();
        let count = map
            .set_incidents_json(
                r#"[{"id": 1, "category": "firearm", "amount": 2, "lat": 13.7, "lng": 100.5, "province_name": "A"}]"#,
            )
            .unwrap();
        assert_eq!(count, 1);
        assert!(matches!(map.set_incidents_json("{}"), Err(MapError::Json(_))));
    }
}
