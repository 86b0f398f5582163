//! Point grouping for the cluster presenter.

use std::f64::consts::PI;

use rstar::RTree;
use rstar::primitives::GeomWithData;

/// Web-Mercator tile edge in pixels at zoom 0.
const TILE_SIZE: f64 = 256.0;

/// Latitude limit of the Web-Mercator projection.
const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

/// A point to be grouped, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Groups points that should share a cluster at a given tile zoom.
pub trait PointClusterer: Send + Sync {
    /// Returns groups of indices into `points`. Every index appears in
    /// exactly one group; groups of one are unclustered points.
    fn group(&self, points: &[ClusterPoint], zoom: f64) -> Vec<Vec<usize>>;
}

/// Projects a point into Web-Mercator pixel space at `zoom`.
#[must_use]
pub fn mercator_pixels(point: ClusterPoint, zoom: f64) -> [f64; 2] {
    let size = TILE_SIZE * zoom.exp2();
    let lat = point.lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    let x = (point.lng + 180.0) / 360.0 * size;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * size;
    [x, y]
}

/// Greedy fixed-radius clustering.
///
/// Points are visited in input order; each point not yet assigned starts
/// a group that takes every unassigned point within `max_radius_px`
/// screen pixels of it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusClusterer {
    pub max_radius_px: f64,
    /// From this zoom on every point stands alone.
    pub disable_at_zoom: f64,
}

impl Default for RadiusClusterer {
    fn default() -> Self {
        Self {
            max_radius_px: 80.0,
            disable_at_zoom: 12.0,
        }
    }
}

impl PointClusterer for RadiusClusterer {
    fn group(&self, points: &[ClusterPoint], zoom: f64) -> Vec<Vec<usize>> {
        if !zoom.is_finite() || zoom >= self.disable_at_zoom || self.max_radius_px <= 0.0 {
            return (0..points.len()).map(|i| vec![i]).collect();
        }

        let pixels: Vec<[f64; 2]> = points.iter().map(|p| mercator_pixels(*p, zoom)).collect();
        let tree = RTree::bulk_load(
            pixels
                .iter()
                .enumerate()
                .filter(|(_, pixel)| pixel.iter().all(|c| c.is_finite()))
                .map(|(index, pixel)| GeomWithData::new(*pixel, index))
                .collect(),
        );

        let radius_sq = self.max_radius_px * self.max_radius_px;
        let mut assigned = vec![false; points.len()];
        let mut groups = Vec::new();

        for (index, pixel) in pixels.iter().enumerate() {
            if assigned[index] {
                continue;
            }
            let mut members: Vec<usize> = tree
                .locate_within_distance(*pixel, radius_sq)
                .map(|entry| entry.data)
                .filter(|member| !assigned[*member])
                .collect();
            // Points with non-finite pixels are not in the tree.
            if !members.contains(&index) {
                members.push(index);
            }
            members.sort_unstable();
            for member in &members {
                assigned[*member] = true;
            }
            groups.push(members);
        }

        log::trace!("Grouped {} points into {} clusters at zoom {zoom}", points.len(), groups.len());
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lng: f64) -> ClusterPoint {
        ClusterPoint { lat, lng }
    }

    #[test]
    fn mercator_origin_is_map_center() {
        let [x, y] = mercator_pixels(point(0.0, 0.0), 0.0);
        assert!((x - 128.0).abs() < 1e-9);
        assert!((y - 128.0).abs() < 1e-9);
    }

    #[test]
    fn nearby_points_group_and_far_points_do_not() {
        let clusterer = RadiusClusterer::default();
        let points = [
            point(13.75, 100.50),
            point(13.76, 100.51),
            point(18.79, 98.98),
        ];
        let groups = clusterer.group(&points, 6.0);
        assert_eq!(groups, vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn every_point_is_assigned_exactly_once() {
        let clusterer = RadiusClusterer::default();
        let points: Vec<_> = (0..50)
            .map(|i| point(f64::from(i).mul_add(0.05, 10.0), f64::from(i % 7).mul_add(0.1, 100.0)))
            .collect();
        let groups = clusterer.group(&points, 8.0);
        let mut seen: Vec<usize> = groups.into_iter().flatten().collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn non_finite_zoom_leaves_every_point_alone() {
        let points = [point(13.75, 100.5), point(13.7501, 100.5001)];
        let clusterer = RadiusClusterer::default();
        assert_eq!(clusterer.group(&points, f64::NAN), vec![vec![0], vec![1]]);
        assert_eq!(clusterer.group(&points, f64::INFINITY), vec![vec![0], vec![1]]);
    }

    #[test]
    fn non_finite_point_still_gets_a_group() {
        let points = [point(13.75, 100.5), point(f64::NAN, 100.5)];
        let groups = RadiusClusterer::default().group(&points, 6.0);
        let mut seen: Vec<usize> = groups.into_iter().flatten().collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1]);
    }

    #[test]
    fn clustering_disabled_at_high_zoom() {
        let clusterer = RadiusClusterer::default();
        let points = [point(13.75, 100.50), point(13.75, 100.50)];
        assert_eq!(clusterer.group(&points, 12.0), vec![vec![0], vec![1]]);
        assert!(clusterer.group(&[], 6.0).is_empty());
    }
}
