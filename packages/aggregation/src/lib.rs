#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Choropleth inputs: per-region incident totals and the colour scale
//! that turns a total into a fill colour.

pub mod cache;
pub mod color;

pub use cache::AggregationCache;
pub use color::{ColorBucket, Palette, text_color_for};

use std::collections::{BTreeMap, HashMap};

use evidence_map_incident_models::{FilterState, Incident};
use evidence_map_region::RegionStore;
use evidence_map_region_models::{RegionId, RegionLevel};

/// Total amount per region id.
pub type AggregationResult = BTreeMap<RegionId, f64>;

/// Name key an incident is matched on at a given tier.
///
/// Lower tiers carry the resolved province id so that equally named
/// districts (or subdistricts) in different provinces never pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum MatchKey<'a> {
    Province(&'a str),
    District(&'a str, RegionId),
    Subdistrict(&'a str, &'a str, RegionId),
}

fn region_keys<'a>(store: &'a RegionStore, level: RegionLevel) -> HashMap<MatchKey<'a>, Vec<RegionId>> {
    let mut keys: HashMap<MatchKey<'a>, Vec<RegionId>> = HashMap::new();
    for region in store.regions(level) {
        let key = match level {
            RegionLevel::Province => Some(MatchKey::Province(&region.name)),
            RegionLevel::District => region
                .parent_id
                .map(|province| MatchKey::District(&region.name, province)),
            RegionLevel::Subdistrict => store.parent_of(level, region.id).and_then(|district| {
                district
                    .parent_id
                    .map(|province| MatchKey::Subdistrict(&region.name, &district.name, province))
            }),
        };
        if let Some(key) = key {
            keys.entry(key).or_default().push(region.id);
        }
    }
    keys
}

fn incident_key<'a>(
    incident: &'a Incident,
    level: RegionLevel,
    province_ids: &HashMap<&str, RegionId>,
) -> Option<MatchKey<'a>> {
    let province = || province_ids.get(incident.province_name.as_str()).copied();
    match level {
        RegionLevel::Province => Some(MatchKey::Province(&incident.province_name)),
        RegionLevel::District => {
            province().map(|province| MatchKey::District(&incident.district_name, province))
        }
        RegionLevel::Subdistrict => province().map(|province| {
            MatchKey::Subdistrict(&incident.subdistrict_name, &incident.district_name, province)
        }),
    }
}

/// Sums the included amounts of `incidents` per region of `level`.
///
/// Every loaded region of the tier appears in the result, with `0.0` when
/// nothing matched. Incidents are matched by name, scoped by ancestry:
/// a district total only counts incidents whose province name resolves to
/// the district's own province.
#[must_use]
pub fn aggregate(
    incidents: &[Incident],
    filters: &FilterState,
    store: &RegionStore,
    level: RegionLevel,
) -> AggregationResult {
    let mut totals: AggregationResult = store.regions(level).map(|r| (r.id, 0.0)).collect();
    if totals.is_empty() {
        return totals;
    }

    let keys = region_keys(store, level);
    let province_ids = store.province_ids_by_name();

    for incident in incidents {
        let Some(amount) = filters.included_amount(incident) else {
            continue;
        };
        let Some(regions) = incident_key(incident, level, &province_ids).and_then(|k| keys.get(&k))
        else {
            continue;
        };
        for id in regions {
            if let Some(total) = totals.get_mut(id) {
                *total += amount;
            }
        }
    }

    log::trace!("Aggregated {} incidents over {} {level} regions", incidents.len(), totals.len());
    totals
}
