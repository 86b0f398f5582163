//! Lazy geometry loading driven by selection and tier visibility.

use evidence_map_region::provider::GeometryProvider;
use evidence_map_region::RegionError;
use evidence_map_region_models::{RegionId, RegionLevel, RegionRecord};

use crate::MapInstance;

impl MapInstance {
    /// Brings the loaded geometry in line with the current selection.
    ///
    /// Provinces are fetched once. Districts are fetched for the selected
    /// provinces while the district tier is visible, subdistricts likewise
    /// for the selected districts. A hidden tier, or one with no selected
    /// parents, is cleared. A failed fetch is logged and leaves its tier
    /// cleared; the map stays usable with what it has.
    pub async fn refresh_geometry(&mut self, provider: &dyn GeometryProvider) {
        if !self.store.is_loaded(RegionLevel::Province) {
            match provider.provinces().await {
                Ok(records) => {
                    self.store_fetched(RegionLevel::Province, Vec::new(), records);
                }
                Err(e) => {
                    log::warn!("Failed to load provinces: {e}");
                    return;
                }
            }
        }

        for level in [RegionLevel::District, RegionLevel::Subdistrict] {
            self.refresh_tier(provider, level).await;
        }
    }

    async fn refresh_tier(&mut self, provider: &dyn GeometryProvider, level: RegionLevel) {
        let Some(parent_level) = level.parent() else {
            return;
        };
        let parents: Vec<RegionId> = self
            .selection
            .selection()
            .tier(parent_level)
            .iter()
            .copied()
            .collect();

        if !self.selection.visible_levels().is_visible(level) || parents.is_empty() {
            if self.store.is_loaded(level) {
                log::debug!("Dropping {level} geometry");
                self.store.clear_tier(level);
            }
            self.fetched.remove(&level);
            return;
        }

        let current = self
            .fetched
            .get(&level)
            .is_some_and(|(fetched, revision)| {
                *fetched == parents && *revision == self.store.revision(level)
            });
        if current && self.store.is_loaded(level) {
            return;
        }

        match fetch(provider, level, &parents).await {
            Ok(records) => self.store_fetched(level, parents, records),
            Err(e) => {
                log::warn!("Failed to load {level} geometry: {e}");
                self.store.clear_tier(level);
                self.fetched.remove(&level);
            }
        }
    }

    fn store_fetched(&mut self, level: RegionLevel, parents: Vec<RegionId>, records: Vec<RegionRecord>) {
        let report = self.store.load_tier(level, records);
        if !report.skipped.is_empty() {
            log::debug!("Skipped {} {level} rows", report.skipped.len());
        }
        self.fetched
            .insert(level, (parents, self.store.revision(level)));
    }
}

async fn fetch(
    provider: &dyn GeometryProvider,
    level: RegionLevel,
    parents: &[RegionId],
) -> Result<Vec<RegionRecord>, RegionError> {
    match level {
        RegionLevel::Province => provider.provinces().await,
        RegionLevel::District => provider.districts(parents).await,
        RegionLevel::Subdistrict => provider.subdistricts(parents).await,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::test_support::{districts, provinces, subdistricts};

    #[derive(Default)]
    struct MemoryProvider {
        calls: Mutex<Vec<(RegionLevel, Vec<RegionId>)>>,
        fail_districts: bool,
    }

    impl MemoryProvider {
        fn calls(&self) -> Vec<(RegionLevel, Vec<RegionId>)> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, level: RegionLevel, parents: &[RegionId]) {
            self.calls.lock().unwrap().push((level, parents.to_vec()));
        }
    }

    fn children_of(records: Vec<RegionRecord>, parents: &[RegionId]) -> Vec<RegionRecord> {
        records
            .into_iter()
            .filter(|r| r.parent_id.is_some_and(|p| parents.contains(&p)))
            .collect()
    }

    #[async_trait]
    impl GeometryProvider for MemoryProvider {
        async fn provinces(&self) -> Result<Vec<RegionRecord>, RegionError> {
            self.record(RegionLevel::Province, &[]);
            Ok(provinces())
        }

        async fn districts(&self, province_ids: &[RegionId]) -> Result<Vec<RegionRecord>, RegionError> {
            self.record(RegionLevel::District, province_ids);
            if self.fail_districts {
                return Err(RegionError::Provider {
                    message: "boundary service unavailable".to_string(),
                });
            }
            Ok(children_of(districts(), province_ids))
        }

        async fn subdistricts(
            &self,
            district_ids: &[RegionId],
        ) -> Result<Vec<RegionRecord>, RegionError> {
            self.record(RegionLevel::Subdistrict, district_ids);
            Ok(children_of(subdistricts(), district_ids))
        }
    }

    #[tokio::test]
    async fn loads_tiers_as_selection_drills_down() {
        let provider = MemoryProvider::default();
        let mut map = MapInstance::default();

        map.refresh_geometry(&provider).await;
        assert_eq!(map.store().len(RegionLevel::Province), 2);
        assert!(!map.store().is_loaded(RegionLevel::District));

        map.toggle(RegionLevel::Province, RegionId(1));
        map.refresh_geometry(&provider).await;
        assert_eq!(map.store().len(RegionLevel::District), 1);

        map.toggle(RegionLevel::District, RegionId(10));
        map.refresh_geometry(&provider).await;
        assert_eq!(map.store().len(RegionLevel::Subdistrict), 1);

        assert_eq!(
            provider.calls(),
            vec![
                (RegionLevel::Province, vec![]),
                (RegionLevel::District, vec![RegionId(1)]),
                (RegionLevel::Subdistrict, vec![RegionId(10)]),
            ]
        );
    }

    #[tokio::test]
    async fn unchanged_parents_are_not_refetched() {
        let provider = MemoryProvider::default();
        let mut map = MapInstance::default();
        map.refresh_geometry(&provider).await;
        map.toggle(RegionLevel::Province, RegionId(2));
        map.refresh_geometry(&provider).await;
        map.refresh_geometry(&provider).await;

        assert_eq!(provider.calls().len(), 2);
    }

    #[tokio::test]
    async fn hidden_or_parentless_tiers_are_cleared() {
        let provider = MemoryProvider::default();
        let mut map = MapInstance::default();
        map.refresh_geometry(&provider).await;
        map.toggle(RegionLevel::Province, RegionId(1));
        map.refresh_geometry(&provider).await;
        assert!(map.store().is_loaded(RegionLevel::District));

        map.toggle_visible_level(RegionLevel::District);
        map.refresh_geometry(&provider).await;
        assert!(!map.store().is_loaded(RegionLevel::District));

        map.toggle_visible_level(RegionLevel::District);
        map.clear_selection(RegionLevel::Province);
        map.refresh_geometry(&provider).await;
        assert!(!map.store().is_loaded(RegionLevel::District));
    }

    #[tokio::test]
    async fn provider_failure_leaves_tier_absent() {
        let provider = MemoryProvider {
            fail_districts: true,
            ..MemoryProvider::default()
        };
        let mut map = MapInstance::default();
        map.refresh_geometry(&provider).await;
        map.toggle(RegionLevel::Province, RegionId(1));
        map.refresh_geometry(&provider).await;

        assert!(!map.store().is_loaded(RegionLevel::District));
        assert_eq!(map.store().len(RegionLevel::Province), 2);
        assert!(map.selection().provinces.contains(&RegionId(1)));
    }
}
