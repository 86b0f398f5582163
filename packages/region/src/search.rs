//! Name search over the loaded hierarchy.
//!
//! Produces the province → district → subdistrict tree shown in the
//! region picker. A matching province brings along everything loaded
//! beneath it; otherwise only the matching descendants (and the ancestors
//! needed to place them) are kept.

use std::collections::BTreeSet;

use evidence_map_region_models::{Region, RegionId, RegionLevel};

use crate::RegionStore;

/// A province and the districts kept beneath it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvinceNode<'a> {
    /// The province.
    pub province: &'a Region,
    /// Districts kept under it.
    pub districts: Vec<DistrictNode<'a>>,
}

/// A district and the subdistricts kept beneath it.
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictNode<'a> {
    /// The district.
    pub district: &'a Region,
    /// Subdistricts kept under it.
    pub subdistricts: Vec<&'a Region>,
}

fn matches(region: &Region, needle: &str) -> bool {
    region.name.to_lowercase().contains(needle)
}

/// Searches region names case-insensitively.
///
/// An empty (or whitespace) term returns the full tree.
#[must_use]
pub fn search<'a>(store: &'a RegionStore, term: &str) -> Vec<ProvinceNode<'a>> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return store
            .regions(RegionLevel::Province)
            .map(|province| full_province(store, province))
            .collect();
    }

    let provinces: BTreeSet<RegionId> = store
        .regions(RegionLevel::Province)
        .filter(|r| matches(r, &needle))
        .map(|r| r.id)
        .collect();
    let districts: BTreeSet<RegionId> = store
        .regions(RegionLevel::District)
        .filter(|r| matches(r, &needle))
        .map(|r| r.id)
        .collect();
    let subdistricts: BTreeSet<RegionId> = store
        .regions(RegionLevel::Subdistrict)
        .filter(|r| matches(r, &needle))
        .map(|r| r.id)
        .collect();

    let mut kept_provinces = provinces.clone();
    kept_provinces.extend(
        districts
            .iter()
            .filter_map(|id| store.province_of(RegionLevel::District, *id)),
    );
    kept_provinces.extend(
        subdistricts
            .iter()
            .filter_map(|id| store.province_of(RegionLevel::Subdistrict, *id)),
    );

    let mut kept_districts = districts.clone();
    kept_districts.extend(subdistricts.iter().filter_map(|id| {
        store
            .parent_of(RegionLevel::Subdistrict, *id)
            .map(|district| district.id)
    }));

    store
        .regions(RegionLevel::Province)
        .filter(|province| kept_provinces.contains(&province.id))
        .map(|province| {
            if provinces.contains(&province.id) {
                return full_province(store, province);
            }
            let district_nodes = store
                .children(RegionLevel::Province, province.id)
                .filter(|district| kept_districts.contains(&district.id))
                .map(|district| {
                    if districts.contains(&district.id) {
                        full_district(store, district)
                    } else {
                        DistrictNode {
                            district,
                            subdistricts: store
                                .children(RegionLevel::District, district.id)
                                .filter(|sd| subdistricts.contains(&sd.id))
                                .collect(),
                        }
                    }
                })
                .collect();
            ProvinceNode {
                province,
                districts: district_nodes,
            }
        })
        .collect()
}

fn full_province<'a>(store: &'a RegionStore, province: &'a Region) -> ProvinceNode<'a> {
    ProvinceNode {
        province,
        districts: store
            .children(RegionLevel::Province, province.id)
            .map(|district| full_district(store, district))
            .collect(),
    }
}

fn full_district<'a>(store: &'a RegionStore, district: &'a Region) -> DistrictNode<'a> {
    DistrictNode {
        district,
        subdistricts: store
            .children(RegionLevel::District, district.id)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evidence_map_region_models::RegionRecord;
    use serde_json::json;

    fn record(id: i64, name: &str, parent: Option<i64>) -> RegionRecord {
        RegionRecord {
            id: RegionId(id),
            name: name.to_string(),
            parent_id: parent.map(RegionId),
            geometry: Some(json!({
                "type": "Polygon",
                "coordinates": [[[100.0, 13.0], [101.0, 13.0], [100.0, 14.0]]]
            })),
        }
    }

    fn store() -> RegionStore {
        let mut store = RegionStore::new();
        store.load_tier(
            RegionLevel::Province,
            vec![record(1, "Chiang Mai", None), record(2, "Phuket", None)],
        );
        store.load_tier(
            RegionLevel::District,
            vec![
                record(10, "Mae Rim", Some(1)),
                record(11, "Hang Dong", Some(1)),
                record(20, "Kathu", Some(2)),
            ],
        );
        store.load_tier(
            RegionLevel::Subdistrict,
            vec![
                record(100, "Rim Tai", Some(10)),
                record(101, "Don Kaeo", Some(10)),
                record(200, "Patong", Some(20)),
            ],
        );
        store
    }

    #[test]
    fn empty_term_returns_everything() {
        let store = store();
        let tree = search(&store, "  ");
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].districts.len(), 2);
        assert_eq!(tree[0].districts[0].subdistricts.len(), 2);
    }

    #[test]
    fn province_match_keeps_whole_subtree() {
        let store = store();
        let tree = search(&store, "chiang");
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].province.id, RegionId(1));
        assert_eq!(tree[0].districts.len(), 2);
    }

    #[test]
    fn subdistrict_match_keeps_only_its_ancestry() {
        let store = store();
        let tree = search(&store, "PATONG");
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].province.id, RegionId(2));
        assert_eq!(tree[0].districts.len(), 1);
        assert_eq!(tree[0].districts[0].subdistricts.len(), 1);
        assert_eq!(tree[0].districts[0].subdistricts[0].id, RegionId(200));
    }

    #[test]
    fn district_match_keeps_its_subdistricts() {
        let store = store();
        let tree = search(&store, "mae rim");
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].districts.len(), 1);
        assert_eq!(tree[0].districts[0].subdistricts.len(), 2);
    }

    #[test]
    fn no_match_is_empty() {
        assert!(search(&store(), "nowhere").is_empty());
    }
}
