//! Selection with parent/child cascade.
//!
//! Selecting a region also selects its missing ancestors. Deselecting a
//! region removes every selected descendant. Ancestors added by a cascade
//! stay selected after their last descendant goes away.
//!
//! The parent of each selected region is remembered when it is selected,
//! so the deselect cascade still works after a tier has been unloaded
//! from the store.

use std::collections::BTreeMap;
use std::sync::Arc;

use evidence_map_region::RegionStore;
use evidence_map_region_models::{RegionId, RegionLevel};

use crate::{SelectionListener, SelectionSet, VisibleLevels};

/// Selection state of one map instance.
#[derive(Default)]
pub struct SelectionModel {
    selection: SelectionSet,
    lineage: BTreeMap<(RegionLevel, RegionId), RegionId>,
    visible: VisibleLevels,
    listeners: Vec<Arc<dyn SelectionListener>>,
}

impl std::fmt::Debug for SelectionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionModel")
            .field("selection", &self.selection)
            .field("visible", &self.visible)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl SelectionModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    #[must_use]
    pub const fn visible_levels(&self) -> VisibleLevels {
        self.visible
    }

    #[must_use]
    pub fn is_selected(&self, level: RegionLevel, id: RegionId) -> bool {
        self.selection.contains(level, id)
    }

    pub fn add_listener(&mut self, listener: Arc<dyn SelectionListener>) {
        self.listeners.push(listener);
    }

    /// Selects `id` if unselected, otherwise deselects it.
    pub fn toggle(&mut self, store: &RegionStore, level: RegionLevel, id: RegionId) {
        if self.is_selected(level, id) {
            self.deselect(store, level, id);
        } else {
            self.select(store, level, id);
        }
    }

    pub fn toggle_province(&mut self, store: &RegionStore, id: RegionId) {
        self.toggle(store, RegionLevel::Province, id);
    }

    pub fn toggle_district(&mut self, store: &RegionStore, id: RegionId) {
        self.toggle(store, RegionLevel::District, id);
    }

    pub fn toggle_subdistrict(&mut self, store: &RegionStore, id: RegionId) {
        self.toggle(store, RegionLevel::Subdistrict, id);
    }

    /// Selects `id` and its missing ancestors. Selecting an already
    /// selected region is a no-op.
    pub fn select(&mut self, store: &RegionStore, level: RegionLevel, id: RegionId) {
        self.mutate(|model| {
            let mut current = (level, id);
            loop {
                let (level, id) = current;
                if model.selection.tier_mut(level).insert(id) {
                    log::debug!("Selected {level} {id}");
                }
                if let Some(child) = level.child() {
                    model.visible.set(child, true);
                }

                let Some(parent_level) = level.parent() else {
                    break;
                };
                let Some(parent) = model
                    .lineage
                    .get(&(level, id))
                    .copied()
                    .or_else(|| store.parent_of(level, id).map(|p| p.id))
                else {
                    log::debug!("{level} {id} has no known parent, cascade stops");
                    break;
                };
                model.lineage.insert((level, id), parent);
                current = (parent_level, parent);
            }
        });
    }

    /// Deselects `id` and every selected descendant.
    pub fn deselect(&mut self, store: &RegionStore, level: RegionLevel, id: RegionId) {
        self.mutate(|model| {
            if !model.selection.tier_mut(level).remove(&id) {
                return;
            }
            log::debug!("Deselected {level} {id}");
            model.lineage.remove(&(level, id));

            let mut removed = vec![id];
            let mut parent_level = level;
            while let Some(child_level) = parent_level.child() {
                let orphans: Vec<RegionId> = model
                    .selection
                    .tier(child_level)
                    .iter()
                    .copied()
                    .filter(|child| {
                        model
                            .parent(store, child_level, *child)
                            .is_some_and(|parent| removed.contains(&parent))
                    })
                    .collect();
                for orphan in &orphans {
                    model.selection.tier_mut(child_level).remove(orphan);
                    model.lineage.remove(&(child_level, *orphan));
                }
                removed = orphans;
                parent_level = child_level;
            }
        });
    }

    fn parent(&self, store: &RegionStore, level: RegionLevel, id: RegionId) -> Option<RegionId> {
        self.lineage
            .get(&(level, id))
            .copied()
            .or_else(|| store.parent_of(level, id).map(|p| p.id))
    }

    /// Empties `level` and every tier below it.
    pub fn clear(&mut self, level: RegionLevel) {
        self.mutate(|model| {
            let mut current = Some(level);
            while let Some(level) = current {
                model.selection.tier_mut(level).clear();
                model.lineage.retain(|(l, _), _| *l != level);
                current = level.child();
            }
        });
    }

    pub fn clear_provinces(&mut self) {
        self.clear(RegionLevel::Province);
    }

    pub fn clear_districts(&mut self) {
        self.clear(RegionLevel::District);
    }

    pub fn clear_subdistricts(&mut self) {
        self.clear(RegionLevel::Subdistrict);
    }

    /// Flips whether `level` is drawn.
    pub const fn toggle_visible_level(&mut self, level: RegionLevel) {
        let visible = self.visible.is_visible(level);
        self.visible.set(level, !visible);
    }

    /// Shows provinces plus exactly the tiers that hold a selection.
    pub fn show_selected_levels(&mut self) {
        self.visible = VisibleLevels {
            province: true,
            district: !self.selection.districts.is_empty()
                || !self.selection.subdistricts.is_empty(),
            subdistrict: !self.selection.subdistricts.is_empty(),
        };
    }

    fn mutate(&mut self, f: impl FnOnce(&mut Self)) {
        let before = self.selection.clone();
        f(self);
        if self.selection != before {
            for listener in &self.listeners {
                listener.selection_changed(&self.selection);
            }
        }
    }
}
