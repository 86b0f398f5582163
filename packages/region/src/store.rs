//! In-memory region hierarchy.
//!
//! Each tier is replaced wholesale on load and stamped with a revision
//! number taken from a store-wide counter, so downstream caches can tell
//! whether the geometry they were computed from is still current.

use std::collections::{BTreeMap, HashMap};

use evidence_map_region_models::{Region, RegionGeometry, RegionId, RegionLevel, RegionRecord};

/// Why a provider record was not admitted into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No geometry was supplied.
    MissingGeometry,
    /// Geometry was present but not a usable polygon/multipolygon.
    MalformedGeometry,
    /// The parent region is not loaded (or no parent id was given).
    OrphanParent,
}

/// Outcome of loading one tier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Number of regions admitted.
    pub loaded: usize,
    /// Records that were dropped, with the reason.
    pub skipped: Vec<(RegionId, SkipReason)>,
}

#[derive(Debug, Clone, Default)]
struct Tier {
    regions: BTreeMap<RegionId, Region>,
    revision: u64,
}

/// Province/district/subdistrict boundaries for one map instance.
#[derive(Debug, Clone, Default)]
pub struct RegionStore {
    tiers: BTreeMap<RegionLevel, Tier>,
    next_revision: u64,
}

impl RegionStore {
    /// Creates an empty store with every tier absent.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces `level` with the given provider records.
    ///
    /// Records with missing or malformed geometry are skipped, as are
    /// districts/subdistricts whose parent is not loaded. Any regions in
    /// lower tiers that lose their parent as a result are pruned.
    pub fn load_tier(&mut self, level: RegionLevel, records: Vec<RegionRecord>) -> LoadReport {
        let mut report = LoadReport::default();
        let mut regions = BTreeMap::new();

        for record in records {
            match self.admit(level, record) {
                Ok(region) => {
                    regions.insert(region.id, region);
                }
                Err((id, reason)) => {
                    log::warn!("Skipping {level} {id}: {reason:?}");
                    report.skipped.push((id, reason));
                }
            }
        }

        report.loaded = regions.len();
        log::info!(
            "Loaded {} {level} regions ({} skipped)",
            report.loaded,
            report.skipped.len()
        );

        let revision = self.bump();
        self.tiers.insert(level, Tier { regions, revision });
        self.prune_orphans(level);

        report
    }

    /// Makes `level` (and everything below it) absent.
    pub fn clear_tier(&mut self, level: RegionLevel) {
        if self.tiers.remove(&level).is_some() {
            log::debug!("Cleared {level} tier");
            self.bump();
        }
        self.prune_orphans(level);
    }

    fn admit(
        &self,
        level: RegionLevel,
        record: RegionRecord,
    ) -> Result<Region, (RegionId, SkipReason)> {
        let id = record.id;
        let raw = record
            .geometry
            .ok_or((id, SkipReason::MissingGeometry))?;
        let geometry =
            RegionGeometry::from_json(&raw).ok_or((id, SkipReason::MalformedGeometry))?;

        let parent_id = match level.parent() {
            None => None,
            Some(parent_level) => {
                let parent = record.parent_id.ok_or((id, SkipReason::OrphanParent))?;
                if self.get(parent_level, parent).is_none() {
                    return Err((id, SkipReason::OrphanParent));
                }
                Some(parent)
            }
        };

        Ok(Region {
            id,
            level,
            name: record.name,
            parent_id,
            geometry,
        })
    }

    fn bump(&mut self) -> u64 {
        self.next_revision += 1;
        self.next_revision
    }

    fn prune_orphans(&mut self, changed: RegionLevel) {
        let mut parent_level = changed;
        while let Some(child_level) = parent_level.child() {
            let Some(mut child) = self.tiers.remove(&child_level) else {
                break;
            };
            let before = child.regions.len();
            child.regions.retain(|_, region| {
                region
                    .parent_id
                    .is_some_and(|parent| self.get(parent_level, parent).is_some())
            });
            if child.regions.len() != before {
                log::debug!(
                    "Pruned {} orphaned {child_level} regions",
                    before - child.regions.len()
                );
                child.revision = self.bump();
            }
            self.tiers.insert(child_level, child);
            parent_level = child_level;
        }
    }

    /// Whether `level` has been loaded (it may still be empty).
    #[must_use]
    pub fn is_loaded(&self, level: RegionLevel) -> bool {
        self.tiers.contains_key(&level)
    }

    /// Revision of `level`; `0` means the tier has never been loaded.
    /// Changes on every load, clear, or prune that touches the tier.
    #[must_use]
    pub fn revision(&self, level: RegionLevel) -> u64 {
        self.tiers.get(&level).map_or(0, |tier| tier.revision)
    }

    /// Looks up a region by tier and id.
    #[must_use]
    pub fn get(&self, level: RegionLevel, id: RegionId) -> Option<&Region> {
        self.tiers.get(&level)?.regions.get(&id)
    }

    /// Iterates the regions of a tier in id order. Empty when absent.
    pub fn regions(&self, level: RegionLevel) -> impl Iterator<Item = &Region> {
        self.tiers
            .get(&level)
            .into_iter()
            .flat_map(|tier| tier.regions.values())
    }

    /// Number of regions loaded for `level`.
    #[must_use]
    pub fn len(&self, level: RegionLevel) -> usize {
        self.tiers.get(&level).map_or(0, |tier| tier.regions.len())
    }

    /// Whether no tier holds any region.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiers.values().all(|tier| tier.regions.is_empty())
    }

    /// The parent region of `(level, id)`, if both are loaded.
    #[must_use]
    pub fn parent_of(&self, level: RegionLevel, id: RegionId) -> Option<&Region> {
        let parent_level = level.parent()?;
        let parent_id = self.get(level, id)?.parent_id?;
        self.get(parent_level, parent_id)
    }

    /// Traces `(level, id)` up to its province id.
    #[must_use]
    pub fn province_of(&self, level: RegionLevel, id: RegionId) -> Option<RegionId> {
        let mut region = self.get(level, id)?;
        while region.level != RegionLevel::Province {
            region = self.parent_of(region.level, region.id)?;
        }
        Some(region.id)
    }

    /// Direct children of `(level, id)` among the loaded regions.
    pub fn children(&self, level: RegionLevel, id: RegionId) -> impl Iterator<Item = &Region> {
        level
            .child()
            .into_iter()
            .flat_map(move |child| self.regions(child))
            .filter(move |region| region.parent_id == Some(id))
    }

    /// Province name → id lookup used to scope lower-tier matches.
    ///
    /// If two provinces share a name the one with the larger id wins.
    #[must_use]
    pub fn province_ids_by_name(&self) -> HashMap<&str, RegionId> {
        self.regions(RegionLevel::Province)
            .map(|region| (region.name.as_str(), region.id))
            .collect()
    }
}
