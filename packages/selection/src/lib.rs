#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Region selection for one map instance.

mod model;

pub use model::SelectionModel;

use std::collections::BTreeSet;

use evidence_map_region_models::{RegionId, RegionLevel};
use serde::{Deserialize, Serialize};

/// Selected region ids per tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSet {
    pub provinces: BTreeSet<RegionId>,
    pub districts: BTreeSet<RegionId>,
    pub subdistricts: BTreeSet<RegionId>,
}

impl SelectionSet {
    #[must_use]
    pub const fn tier(&self, level: RegionLevel) -> &BTreeSet<RegionId> {
        match level {
            RegionLevel::Province => &self.provinces,
            RegionLevel::District => &self.districts,
            RegionLevel::Subdistrict => &self.subdistricts,
        }
    }

    pub(crate) const fn tier_mut(&mut self, level: RegionLevel) -> &mut BTreeSet<RegionId> {
        match level {
            RegionLevel::Province => &mut self.provinces,
            RegionLevel::District => &mut self.districts,
            RegionLevel::Subdistrict => &mut self.subdistricts,
        }
    }

    #[must_use]
    pub fn contains(&self, level: RegionLevel, id: RegionId) -> bool {
        self.tier(level).contains(&id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.provinces.is_empty() && self.districts.is_empty() && self.subdistricts.is_empty()
    }

    /// The finest tier with at least one selected region.
    #[must_use]
    pub fn most_specific_level(&self) -> Option<RegionLevel> {
        [
            RegionLevel::Subdistrict,
            RegionLevel::District,
            RegionLevel::Province,
        ]
        .into_iter()
        .find(|level| !self.tier(*level).is_empty())
    }
}

/// Which tiers are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisibleLevels {
    pub province: bool,
    pub district: bool,
    pub subdistrict: bool,
}

impl Default for VisibleLevels {
    fn default() -> Self {
        Self {
            province: true,
            district: false,
            subdistrict: false,
        }
    }
}

impl VisibleLevels {
    #[must_use]
    pub const fn is_visible(&self, level: RegionLevel) -> bool {
        match level {
            RegionLevel::Province => self.province,
            RegionLevel::District => self.district,
            RegionLevel::Subdistrict => self.subdistrict,
        }
    }

    pub const fn set(&mut self, level: RegionLevel, visible: bool) {
        match level {
            RegionLevel::Province => self.province = visible,
            RegionLevel::District => self.district = visible,
            RegionLevel::Subdistrict => self.subdistrict = visible,
        }
    }
}

/// Receives the full selection after every effective change.
pub trait SelectionListener: Send + Sync {
    fn selection_changed(&self, selection: &SelectionSet);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn most_specific_level_prefers_finest_tier() {
        let mut set = SelectionSet::default();
        assert_eq!(set.most_specific_level(), None);
        set.provinces.insert(RegionId(1));
        assert_eq!(set.most_specific_level(), Some(RegionLevel::Province));
        set.subdistricts.insert(RegionId(100));
        assert_eq!(set.most_specific_level(), Some(RegionLevel::Subdistrict));
    }

    #[test]
    fn selection_set_serializes_as_id_lists() {
        let mut set = SelectionSet::default();
        set.districts.insert(RegionId(7));
        assert_eq!(
            serde_json::to_value(&set).unwrap(),
            serde_json::json!({"provinces": [], "districts": [7], "subdistricts": []})
        );
    }
}
