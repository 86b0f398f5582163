//! Memoized aggregation.
//!
//! A result is reused only while every input it was computed from is
//! unchanged. Any difference in the key triggers a full recomputation;
//! results are never patched.

use std::collections::BTreeMap;

use evidence_map_incident_models::{FilterState, Incident};
use evidence_map_region::RegionStore;
use evidence_map_region_models::RegionLevel;

use crate::{AggregationResult, aggregate};

/// Everything a tier's totals depend on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AggregationKey {
    pub incident_revision: u64,
    pub filters: FilterState,
    /// Store revisions of the tier and each of its ancestors, finest first.
    pub geometry_revisions: Vec<u64>,
}

impl AggregationKey {
    #[must_use]
    pub fn new(
        incident_revision: u64,
        filters: &FilterState,
        store: &RegionStore,
        level: RegionLevel,
    ) -> Self {
        let geometry_revisions =
            std::iter::successors(Some(level), |level| level.parent())
                .map(|level| store.revision(level))
                .collect();
        Self {
            incident_revision,
            filters: filters.clone(),
            geometry_revisions,
        }
    }
}

/// Per-tier memo of the last aggregation.
#[derive(Debug, Clone, Default)]
pub struct AggregationCache {
    entries: BTreeMap<RegionLevel, (AggregationKey, AggregationResult)>,
    recomputations: u64,
}

impl AggregationCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the totals for `level`, recomputing only if an input changed.
    ///
    /// `incident_revision` must change whenever `incidents` does.
    pub fn totals(
        &mut self,
        incidents: &[Incident],
        incident_revision: u64,
        filters: &FilterState,
        store: &RegionStore,
        level: RegionLevel,
    ) -> &AggregationResult {
        let key = AggregationKey::new(incident_revision, filters, store, level);
        let stale = self
            .entries
            .get(&level)
            .is_none_or(|(cached, _)| *cached != key);

        if stale {
            log::debug!("Recomputing {level} totals");
            self.recomputations += 1;
            let totals = aggregate(incidents, filters, store, level);
            self.entries.insert(level, (key, totals));
        }

        &self.entries[&level].1
    }

    /// Number of full recomputations performed so far.
    #[must_use]
    pub const fn recomputations(&self) -> u64 {
        self.recomputations
    }

    /// Drops every memoized result.
    pub fn invalidate(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{incident, record, store};
    use evidence_map_region_models::RegionId;

    #[test]
    fn identical_inputs_reuse_result() {
        let store = store();
        let incidents = vec![incident("gun", 3.0, "A")];
        let filters = FilterState::default();
        let mut cache = AggregationCache::new();

        let first = cache
            .totals(&incidents, 1, &filters, &store, RegionLevel::Province)
            .clone();
        let second = cache
            .totals(&incidents, 1, &filters, &store, RegionLevel::Province)
            .clone();
        assert_eq!(first, second);
        assert_eq!(cache.recomputations(), 1);
    }

    #[test]
    fn any_key_change_recomputes() {
        let mut store = store();
        let incidents = vec![incident("gun", 3.0, "A"), incident("meth", 2.0, "A")];
        let mut filters = FilterState::default();
        let mut cache = AggregationCache::new();

        cache.totals(&incidents, 1, &filters, &store, RegionLevel::District);
        cache.totals(&incidents, 2, &filters, &store, RegionLevel::District);
        assert_eq!(cache.recomputations(), 2);

        filters.toggle("meth");
        let totals = cache.totals(&incidents, 2, &filters, &store, RegionLevel::District);
        assert_eq!(totals[&RegionId(10)], 3.0);
        assert_eq!(cache.recomputations(), 3);

        store.load_tier(
            RegionLevel::Province,
            vec![record(1, "A", None), record(2, "B", None)],
        );
        let totals = cache.totals(&incidents, 2, &filters, &store, RegionLevel::District);
        assert_eq!(totals[&RegionId(10)], 3.0);
        assert_eq!(cache.recomputations(), 4, "ancestor tier reload must invalidate");
    }

    #[test]
    fn tiers_are_cached_independently() {
        let store = store();
        let incidents = vec![incident("gun", 3.0, "A")];
        let filters = FilterState::default();
        let mut cache = AggregationCache::new();

        cache.totals(&incidents, 1, &filters, &store, RegionLevel::Province);
        cache.totals(&incidents, 1, &filters, &store, RegionLevel::District);
        cache.totals(&incidents, 1, &filters, &store, RegionLevel::Province);
        assert_eq!(cache.recomputations(), 2);
    }
}
