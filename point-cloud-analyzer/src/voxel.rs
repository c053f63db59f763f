/// Sparse voxel grid binning
use crate::bounds::PointCloudBounds;
use crate::point::Point;
use std::collections::HashMap;
use tracing::{debug, info};

/// Scaled coordinates at or beyond this magnitude have no usable cell key.
const KEY_LIMIT: f64 = (1u64 << 62) as f64;

/// Integer cell coordinate: `floor(coord / voxel_size)` per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoxelKey {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl VoxelKey {
    /// Cell containing `p`, or `None` when a scaled coordinate is out of key range.
    pub fn from_point(p: &Point, voxel_size: f64) -> Option<Self> {
        let axis = |coord: f64| {
            let scaled = (coord / voxel_size).floor();
            (scaled.abs() < KEY_LIMIT).then_some(scaled as i64)
        };
        Some(Self {
            x: axis(p.x)?,
            y: axis(p.y)?,
            z: axis(p.z)?,
        })
    }

    pub fn offset(&self, dx: i64, dy: i64, dz: i64) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            z: self.z.saturating_add(dz),
        }
    }

    /// World-space box covered by this cell.
    pub fn world_bounds(&self, voxel_size: f64) -> PointCloudBounds {
        PointCloudBounds::from_min_max(
            Point::new(
                self.x as f64 * voxel_size,
                self.y as f64 * voxel_size,
                self.z as f64 * voxel_size,
            ),
            Point::new(
                (self.x as f64 + 1.0) * voxel_size,
                (self.y as f64 + 1.0) * voxel_size,
                (self.z as f64 + 1.0) * voxel_size,
            ),
        )
    }
}

/// An occupied grid cell retained for merging.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelCell {
    pub key: VoxelKey,
    /// Indices into the source point list.
    pub points: Vec<usize>,
    pub bounds: PointCloudBounds,
}

impl VoxelCell {
    pub fn point_count(&self) -> usize {
        self.points.len()
    }
}

/// Bin points into cells and keep those with at least `min_points` members.
///
/// Cells are emitted sorted by key so downstream stages see the same order
/// regardless of input point order. `_scene_bounds` is informational.
pub fn build_voxel_grid(
    points: &[Point],
    voxel_size: f64,
    min_points: usize,
    _scene_bounds: &PointCloudBounds,
) -> Vec<VoxelCell> {
    let mut grid: HashMap<VoxelKey, Vec<usize>> = HashMap::new();
    let mut out_of_range = 0usize;
    for (index, p) in points.iter().enumerate() {
        match VoxelKey::from_point(p, voxel_size) {
            Some(key) => grid.entry(key).or_default().push(index),
            None => out_of_range += 1,
        }
    }
    if out_of_range > 0 {
        debug!("Skipped {} points outside the voxel key range", out_of_range);
    }
    let occupied = grid.len();

    let mut cells: Vec<VoxelCell> = grid
        .into_iter()
        .filter(|(_, members)| members.len() >= min_points)
        .map(|(key, members)| VoxelCell {
            key,
            points: members,
            bounds: key.world_bounds(voxel_size),
        })
        .collect();
    cells.sort_by_key(|c| c.key);

    debug!(
        "Discarded {} cells below {} points",
        occupied - cells.len(),
        min_points
    );
    info!(
        "Voxel grid: {} occupied cells, {} retained (size {})",
        occupied,
        cells.len(),
        voxel_size
    );
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(points: &[Point]) -> PointCloudBounds {
        PointCloudBounds::from_points(points).unwrap()
    }

    #[test]
    fn key_uses_floor_division() {
        assert_eq!(
            VoxelKey::from_point(&Point::new(-0.1, 0.0, 0.99), 1.0),
            Some(VoxelKey { x: -1, y: 0, z: 0 })
        );
        assert_eq!(
            VoxelKey::from_point(&Point::new(0.5, 0.25, -0.25), 0.25),
            Some(VoxelKey { x: 2, y: 1, z: -1 })
        );
    }

    #[test]
    fn huge_coordinates_are_skipped_instead_of_overflowing() {
        let points = vec![Point::new(3e18, 0.0, 0.0), Point::new(0.0, 0.0, 0.0)];
        assert_eq!(VoxelKey::from_point(&points[0], 0.25), None);

        let cells = build_voxel_grid(&points, 0.25, 1, &scene(&points));
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].points, vec![1]);
        assert_eq!(crate::merge::merge_regions(&cells).len(), 1);
    }

    #[test]
    fn offset_saturates_at_key_extremes() {
        let edge = VoxelKey { x: i64::MAX, y: i64::MIN, z: 0 };
        assert_eq!(edge.offset(1, -1, 1), VoxelKey { x: i64::MAX, y: i64::MIN, z: 1 });
    }

    #[test]
    fn isolated_point_below_threshold_is_dropped() {
        let points = vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(0.1, 0.0, 0.0),
            Point::new(0.0, 0.0, 0.1),
            Point::new(5.0, 0.0, 5.0),
        ];
        let cells = build_voxel_grid(&points, 1.0, 2, &scene(&points));
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].key, VoxelKey { x: 0, y: 0, z: 0 });
        assert_eq!(cells[0].points, vec![0, 1, 2]);
        assert_eq!(
            cells[0].bounds,
            PointCloudBounds::from_min_max(Point::new(0.0, 0.0, 0.0), Point::new(1.0, 1.0, 1.0))
        );
    }

    #[test]
    fn every_point_lands_in_exactly_one_cell() {
        let points: Vec<Point> = (0..500)
            .map(|i| Point::new((i % 7) as f64 * 0.3, (i % 5) as f64 * 0.2, (i % 3) as f64))
            .collect();
        let cells = build_voxel_grid(&points, 0.5, 1, &scene(&points));
        let mut seen: Vec<usize> = cells.iter().flat_map(|c| c.points.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..points.len()).collect::<Vec<_>>());
    }

    #[test]
    fn emission_is_invariant_to_point_order() {
        let points: Vec<Point> = (0..300)
            .map(|i| Point::new((i % 11) as f64 * 0.13, (i % 4) as f64 * 0.4, (i % 9) as f64 * 0.21))
            .collect();
        let mut reversed = points.clone();
        reversed.reverse();

        let forward = build_voxel_grid(&points, 0.25, 3, &scene(&points));
        let backward = build_voxel_grid(&reversed, 0.25, 3, &scene(&reversed));

        let summary = |cells: &[VoxelCell]| -> Vec<(VoxelKey, usize)> {
            cells.iter().map(|c| (c.key, c.point_count())).collect()
        };
        assert_eq!(summary(&forward), summary(&backward));
    }
}
