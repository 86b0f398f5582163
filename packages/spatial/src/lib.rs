#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Point presentation of the filtered incident set.
//!
//! Two interchangeable presenters render the same input: marker clusters
//! with amount-coloured badges, or a weighted heatmap. Which one runs is
//! an explicit [`ViewMode`], not a renderer plugin.

pub mod cluster;
pub mod clusterer;
pub mod heatmap;

pub use cluster::{ClusterBadge, ClusterConfig, ClusterItem, ClusterPresenter, Marker};
pub use clusterer::{ClusterPoint, PointClusterer, RadiusClusterer};
pub use heatmap::{GradientStop, HeatPoint, HeatmapLayer, HeatmapOptions, HeatmapPresenter};

use evidence_map_incident_models::{EffectiveType, FilterState, Incident};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Which point presentation is active.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ViewMode {
    /// Clustered markers.
    #[default]
    Markers,
    /// Weighted heat layer.
    Heatmap,
}

/// An incident that passed the type filters and has a usable location.
#[derive(Debug, Clone, PartialEq)]
pub struct PresentedIncident<'a> {
    pub incident: &'a Incident,
    pub effective_type: EffectiveType,
    pub lat: f64,
    pub lng: f64,
}

/// Selects the incidents both presenters draw.
///
/// Incidents without a recorded amount are kept; they are still points
/// on the map even though they add nothing to region totals.
#[must_use]
pub fn presentable<'a>(incidents: &'a [Incident], filters: &FilterState) -> Vec<PresentedIncident<'a>> {
    incidents
        .iter()
        .filter_map(|incident| {
            let effective_type = filters.admitted_type(incident)?;
            let (lat, lng) = incident.location()?;
            Some(PresentedIncident {
                incident,
                effective_type,
                lat,
                lng,
            })
        })
        .collect()
}

/// Output of a presenter, ready for a tiled renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "layer", rename_all = "snake_case")]
pub enum SpatialLayer {
    Clusters { items: Vec<ClusterItem> },
    Heatmap(HeatmapLayer),
}

impl SpatialLayer {
    /// Whether nothing would be drawn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Clusters { items } => items.is_empty(),
            Self::Heatmap(layer) => layer.points.is_empty(),
        }
    }
}

/// The active point presenter.
#[derive(Debug)]
pub enum SpatialPresenter {
    Cluster(ClusterPresenter),
    Heatmap(HeatmapPresenter),
}

impl SpatialPresenter {
    /// Builds the presenter for `mode`.
    #[must_use]
    pub fn for_mode(
        mode: ViewMode,
        cluster: ClusterPresenter,
        heatmap: HeatmapPresenter,
    ) -> Self {
        match mode {
            ViewMode::Markers => Self::Cluster(cluster),
            ViewMode::Heatmap => Self::Heatmap(heatmap),
        }
    }

    #[must_use]
    pub const fn mode(&self) -> ViewMode {
        match self {
            Self::Cluster(_) => ViewMode::Markers,
            Self::Heatmap(_) => ViewMode::Heatmap,
        }
    }

    /// Renders `incidents` through the filters at the given tile zoom.
    #[must_use]
    pub fn present(&self, incidents: &[Incident], filters: &FilterState, zoom: f64) -> SpatialLayer {
        let points = presentable(incidents, filters);
        match self {
            Self::Cluster(presenter) => SpatialLayer::Clusters {
                items: presenter.present(&points, zoom),
            },
            Self::Heatmap(presenter) => SpatialLayer::Heatmap(presenter.present(&points)),
        }
    }
}
