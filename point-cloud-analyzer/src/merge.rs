/// Connected-component merging of retained voxel cells
use crate::bounds::PointCloudBounds;
use crate::voxel::{VoxelCell, VoxelKey};
use std::collections::{HashMap, VecDeque};
use tracing::info;

/// Union box of one connected component of voxel cells.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRegion {
    pub bounds: PointCloudBounds,
    pub point_count: usize,
    pub cell_count: usize,
}

/// Adjacency rule between two cell keys.
///
/// Every per-axis index delta is at most 1 and the deltas sum to at most 1,
/// which leaves only the six face neighbours.
pub fn is_adjacent(a: &VoxelKey, b: &VoxelKey) -> bool {
    let dx = a.x.abs_diff(b.x);
    let dy = a.y.abs_diff(b.y);
    let dz = a.z.abs_diff(b.z);
    dx <= 1 && dy <= 1 && dz <= 1 && dx + dy + dz <= 1
}

/// Offsets in the 3x3x3 neighbourhood that satisfy the adjacency rule.
fn neighbour_offsets() -> Vec<(i64, i64, i64)> {
    let origin = VoxelKey { x: 0, y: 0, z: 0 };
    let mut offsets = Vec::with_capacity(6);
    for dx in -1..=1 {
        for dy in -1..=1 {
            for dz in -1..=1 {
                let candidate = origin.offset(dx, dy, dz);
                if candidate != origin && is_adjacent(&origin, &candidate) {
                    offsets.push((dx, dy, dz));
                }
            }
        }
    }
    offsets
}

/// Partition cells into connected components, one region per component.
///
/// Components are found by breadth-first search over an index arena with a
/// hash lookup for neighbours.
///
/// Traversal starts from cells in input order; with sorted input the output
/// order is stable.
pub fn merge_regions(cells: &[VoxelCell]) -> Vec<MergedRegion> {
    let index: HashMap<VoxelKey, usize> = cells
        .iter()
        .enumerate()
        .map(|(i, cell)| (cell.key, i))
        .collect();
    let offsets = neighbour_offsets();

    let mut visited = vec![false; cells.len()];
    let mut queue = VecDeque::new();
    let mut regions = Vec::new();

    for start in 0..cells.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        queue.push_back(start);

        let mut bounds = PointCloudBounds::new();
        let mut point_count = 0;
        let mut cell_count = 0;

        while let Some(current) = queue.pop_front() {
            let cell = &cells[current];
            bounds = bounds.union(&cell.bounds);
            point_count += cell.point_count();
            cell_count += 1;

            for &(dx, dy, dz) in &offsets {
                if let Some(&neighbour) = index.get(&cell.key.offset(dx, dy, dz)) {
                    if !visited[neighbour] {
                        visited[neighbour] = true;
                        queue.push_back(neighbour);
                    }
                }
            }
        }

        regions.push(MergedRegion {
            bounds,
            point_count,
            cell_count,
        });
    }

    info!(
        "Merged {} cells into {} regions",
        cells.len(),
        regions.len()
    );
    regions
}
