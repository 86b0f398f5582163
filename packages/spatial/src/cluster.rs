//! Marker clusters with amount-coloured badges.

use std::collections::BTreeMap;

use evidence_map_aggregation::{Palette, text_color_for};
use evidence_map_incident_models::EffectiveType;
use geo::{Centroid, MultiPoint, Point};
use serde::{Deserialize, Serialize};

use crate::PresentedIncident;
use crate::clusterer::{ClusterPoint, PointClusterer, RadiusClusterer};

/// Cluster presentation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClusterConfig {
    pub max_cluster_radius_px: f64,
    pub disable_clustering_at_zoom: f64,
    /// Badge diameter for fewer than 10 points.
    pub small_diameter: u32,
    /// Badge diameter for 10 to 99 points.
    pub medium_diameter: u32,
    /// Badge diameter for 100 points or more.
    pub large_diameter: u32,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            max_cluster_radius_px: 80.0,
            disable_clustering_at_zoom: 12.0,
            small_diameter: 30,
            medium_diameter: 40,
            large_diameter: 50,
        }
    }
}

impl ClusterConfig {
    #[must_use]
    pub const fn diameter_for(&self, point_count: usize) -> u32 {
        match point_count {
            0..10 => self.small_diameter,
            10..100 => self.medium_diameter,
            _ => self.large_diameter,
        }
    }

    /// The default clusterer for these settings.
    #[must_use]
    pub const fn clusterer(&self) -> RadiusClusterer {
        RadiusClusterer {
            max_radius_px: self.max_cluster_radius_px,
            disable_at_zoom: self.disable_clustering_at_zoom,
        }
    }
}

/// A group of two or more incidents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterBadge {
    pub point_count: usize,
    /// Sum of member amounts; members without an amount add nothing.
    pub amount_total: f64,
    pub color: String,
    pub text_color: String,
    pub diameter: u32,
    pub lat: f64,
    pub lng: f64,
    pub province: String,
    pub members: Vec<i64>,
}

/// A single, unclustered incident.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub id: i64,
    pub effective_type: EffectiveType,
    pub amount: Option<f64>,
    pub lat: f64,
    pub lng: f64,
    pub province: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClusterItem {
    Badge(ClusterBadge),
    Marker(Marker),
}

/// Groups incidents per province and styles each group.
pub struct ClusterPresenter {
    clusterer: Box<dyn PointClusterer>,
    config: ClusterConfig,
    palette: Palette,
}

impl std::fmt::Debug for ClusterPresenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterPresenter")
            .field("config", &self.config)
            .field("palette", &self.palette)
            .finish_non_exhaustive()
    }
}

impl Default for ClusterPresenter {
    fn default() -> Self {
        Self::new(ClusterConfig::default(), Palette::default())
    }
}

impl ClusterPresenter {
    /// Uses the built-in [`RadiusClusterer`].
    #[must_use]
    pub fn new(config: ClusterConfig, palette: Palette) -> Self {
        Self::with_clusterer(Box::new(config.clusterer()), config, palette)
    }

    /// Uses a custom point grouping strategy.
    #[must_use]
    pub fn with_clusterer(
        clusterer: Box<dyn PointClusterer>,
        config: ClusterConfig,
        palette: Palette,
    ) -> Self {
        Self {
            clusterer,
            config,
            palette,
        }
    }

    /// Clusters `points` at tile zoom `zoom`.
    ///
    /// Incidents of different provinces never share a cluster.
    #[must_use]
    pub fn present(&self, points: &[PresentedIncident<'_>], zoom: f64) -> Vec<ClusterItem> {
        let mut by_province: BTreeMap<&str, Vec<&PresentedIncident<'_>>> = BTreeMap::new();
        for point in points {
            by_province
                .entry(point.incident.province_name.as_str())
                .or_default()
                .push(point);
        }

        let mut items = Vec::new();
        for (province, members) in by_province {
            let cluster_points: Vec<ClusterPoint> = members
                .iter()
                .map(|p| ClusterPoint {
                    lat: p.lat,
                    lng: p.lng,
                })
                .collect();
            for group in self.clusterer.group(&cluster_points, zoom) {
                let group: Vec<&PresentedIncident<'_>> =
                    group.into_iter().filter_map(|i| members.get(i).copied()).collect();
                match group.as_slice() {
                    [] => {}
                    [single] => items.push(ClusterItem::Marker(marker(single))),
                    _ => items.push(ClusterItem::Badge(self.badge(province, &group))),
                }
            }
        }
        items
    }

    fn badge(&self, province: &str, group: &[&PresentedIncident<'_>]) -> ClusterBadge {
        let amount_total: f64 = group
            .iter()
            .filter_map(|p| p.incident.finite_amount())
            .sum();
        let color = self.palette.color_for(amount_total).to_string();
        let text_color = text_color_for(&color).to_string();

        let centroid = MultiPoint::from(
            group
                .iter()
                .map(|p| Point::new(p.lng, p.lat))
                .collect::<Vec<_>>(),
        )
        .centroid()
        .unwrap_or_else(|| Point::new(group[0].lng, group[0].lat));

        ClusterBadge {
            point_count: group.len(),
            amount_total,
            color,
            text_color,
            diameter: self.config.diameter_for(group.len()),
            lat: centroid.y(),
            lng: centroid.x(),
            province: province.to_string(),
            members: group.iter().map(|p| p.incident.id).collect(),
        }
    }
}

fn marker(point: &PresentedIncident<'_>) -> Marker {
    Marker {
        id: point.incident.id,
        effective_type: point.effective_type.clone(),
        amount: point.incident.finite_amount(),
        lat: point.lat,
        lng: point.lng,
        province: point.incident.province_name.clone(),
    }
}
