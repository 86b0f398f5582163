use serde::{Deserialize, Serialize};

use evidence_map_region_models::RegionGeometry;

use crate::{WorldPoint, project_position};

/// Axis-aligned rectangle in projected world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl WorldBounds {
    /// Bounds covering a single point.
    #[must_use]
    pub const fn from_point(point: WorldPoint) -> Self {
        Self {
            min_x: point.x,
            min_y: point.y,
            max_x: point.x,
            max_y: point.y,
        }
    }

    /// Grows the bounds to include `point`.
    pub const fn extend(&mut self, point: WorldPoint) {
        self.min_x = self.min_x.min(point.x);
        self.min_y = self.min_y.min(point.y);
        self.max_x = self.max_x.max(point.x);
        self.max_y = self.max_y.max(point.y);
    }

    /// Smallest rectangle containing both.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Bounds of every valid position across `geometries`.
    ///
    /// Positions failing the projection checks are ignored. Returns `None`
    /// when no valid position exists.
    pub fn from_geometries<'a>(
        geometries: impl IntoIterator<Item = &'a RegionGeometry>,
    ) -> Option<Self> {
        geometries
            .into_iter()
            .flat_map(RegionGeometry::rings)
            .flatten()
            .filter_map(project_position)
            .fold(None, |bounds: Option<Self>, point| {
                Some(bounds.map_or_else(
                    || Self::from_point(point),
                    |mut bounds| {
                        bounds.extend(point);
                        bounds
                    },
                ))
            })
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    #[must_use]
    pub fn center(&self) -> WorldPoint {
        WorldPoint {
            x: f64::midpoint(self.min_x, self.max_x),
            y: f64::midpoint(self.min_y, self.max_y),
        }
    }

    /// Whether the rectangle has no area (or non-finite edges).
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        let (width, height) = (self.width(), self.height());
        !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bounds_span_all_valid_points() {
        let a = RegionGeometry::from_json(&json!({
            "type": "Polygon",
            "coordinates": [[[100.0, 13.0], [101.0, 14.0], ["x", 1.0]]]
        }))
        .unwrap();
        let b = RegionGeometry::from_json(&json!({
            "type": "Polygon",
            "coordinates": [[[99.0, 15.0], [99.5, 15.5]]]
        }))
        .unwrap();

        let bounds = WorldBounds::from_geometries([&a, &b]).unwrap();
        assert_eq!(
            bounds,
            WorldBounds {
                min_x: 99.0,
                min_y: -15.5,
                max_x: 101.0,
                max_y: -13.0,
            }
        );
        assert!((bounds.width() - 2.0).abs() < 1e-9);
        assert!((bounds.center().y + 14.25).abs() < 1e-9);
        assert!(!bounds.is_degenerate());
    }

    #[test]
    fn no_valid_points_means_no_bounds() {
        let empty = RegionGeometry::from_json(&json!({"type": "Polygon", "coordinates": [[]]})).unwrap();
        assert!(WorldBounds::from_geometries([&empty]).is_none());
        assert!(WorldBounds::from_geometries(std::iter::empty()).is_none());
    }

    #[test]
    fn single_point_is_degenerate() {
        let bounds = WorldBounds::from_point(WorldPoint { x: 100.0, y: -13.0 });
        assert!(bounds.is_degenerate());
    }
}
