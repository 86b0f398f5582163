#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Projection of region boundaries into 2D vector paths.
//!
//! The projection is deliberately flat: a `[lng, lat]` position maps to
//! world coordinates `(x, y) = (lng, -lat)`. Latitude is negated because
//! vector y grows downwards. No ellipsoidal or Mercator correction is
//! applied; over the small, low-latitude national territory the
//! east-west stretching is a few percent and acceptable for a
//! diagrammatic map. Do not reuse this for areas far from the equator.

mod bounds;

pub use bounds::WorldBounds;

use std::fmt::{self, Write as _};

use evidence_map_region_models::{PolygonRings, Position, RegionGeometry, Ring};
use serde::{Deserialize, Serialize};

/// A point in projected world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    /// Longitude.
    pub x: f64,
    /// Negated latitude.
    pub y: f64,
}

/// Projects a raw position.
///
/// Returns `None` if the position has fewer than two components or
/// either of the first two is not finite. Extra components (altitude)
/// are ignored.
#[must_use]
pub fn project_position(position: &Position) -> Option<WorldPoint> {
    match position.as_slice() {
        [lng, lat, ..] if lng.is_finite() && lat.is_finite() => Some(WorldPoint { x: *lng, y: -*lat }),
        _ => None,
    }
}

/// One path drawing command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathCommand {
    /// Start a new subpath.
    MoveTo(WorldPoint),
    /// Straight segment to a point.
    LineTo(WorldPoint),
    /// Close the current subpath.
    Close,
}

/// Vector path description, one closed subpath per ring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathData {
    commands: Vec<PathCommand>,
}

impl PathData {
    /// The drawing commands in order.
    #[must_use]
    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    /// Whether nothing would be drawn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of closed subpaths.
    #[must_use]
    pub fn subpath_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, PathCommand::Close))
            .count()
    }

    /// Appends one ring as a closed subpath.
    ///
    /// Invalid positions are dropped; the first surviving position becomes
    /// the move. A ring with no valid position contributes nothing.
    pub fn push_ring(&mut self, ring: &Ring) {
        let mut points = ring.iter().filter_map(project_position);
        let Some(first) = points.next() else {
            return;
        };
        self.commands.push(PathCommand::MoveTo(first));
        self.commands.extend(points.map(PathCommand::LineTo));
        self.commands.push(PathCommand::Close);
    }
}

impl fmt::Display for PathData {
    /// Formats as SVG path syntax: `M x y L x y ... Z`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        for command in &self.commands {
            if !out.is_empty() {
                out.push(' ');
            }
            match command {
                PathCommand::MoveTo(p) => write!(out, "M {} {}", p.x, p.y)?,
                PathCommand::LineTo(p) => write!(out, "L {} {}", p.x, p.y)?,
                PathCommand::Close => out.push('Z'),
            }
        }
        f.write_str(&out)
    }
}

/// Projects a list of polygons.
#[must_use]
pub fn project_polygons(polygons: &[PolygonRings]) -> PathData {
    let mut path = PathData::default();
    for ring in polygons.iter().flatten() {
        path.push_ring(ring);
    }
    path
}

/// Projects a region boundary.
#[must_use]
pub fn project_geometry(geometry: &RegionGeometry) -> PathData {
    project_polygons(&geometry.polygons)
}
