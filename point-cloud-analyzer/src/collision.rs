/// Walkability grid over the horizontal footprint
use crate::bounds::{PointCloudBounds, round_to};
use crate::config::CollisionConfig;
use crate::point::Point;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use tracing::info;

/// Grid origin and shape, keyed the way `collision_map.json` readers expect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollisionMetadata {
    pub min_x: f64,
    pub min_z: f64,
    pub min_y: f64,
    pub grid_size: f64,
    pub cols: usize,
    pub rows: usize,
}

/// Floor height and blocked flag of one (x, z) column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CollisionCell {
    /// Floor height, 3 decimals.
    pub y: f64,
    /// 1 when blocked.
    pub b: u8,
}

impl CollisionCell {
    pub fn is_blocked(&self) -> bool {
        self.b == 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollisionMap {
    pub metadata: CollisionMetadata,
    /// Keyed by (column, row); serialised under `map` as `"c,r"`.
    #[serde(rename = "map", serialize_with = "serialize_cells")]
    pub cells: BTreeMap<(usize, usize), CollisionCell>,
}

fn serialize_cells<S: Serializer>(
    cells: &BTreeMap<(usize, usize), CollisionCell>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(cells.iter().map(|((c, r), cell)| (format!("{},{}", c, r), cell)))
}

fn grid_index(offset: f64, grid_size: f64, count: usize) -> usize {
    ((offset / grid_size).max(0.0) as usize).min(count - 1)
}

fn is_blocked(heights: &[f64], floor_y: f64, config: &CollisionConfig) -> bool {
    let max_y = heights.iter().copied().fold(floor_y, f64::max);
    if max_y - floor_y > config.player_height {
        return true;
    }
    heights
        .iter()
        .any(|&h| h > floor_y + config.ankle_height && h < floor_y + config.player_height)
}

/// Build the walkability grid for a cloud with known bounds.
pub fn build_collision_map(
    points: &[Point],
    bounds: &PointCloudBounds,
    config: &CollisionConfig,
) -> CollisionMap {
    let (width_x, _, depth_z) = bounds.dimensions();
    let cols = ((width_x / config.grid_size).ceil() as usize).max(1);
    let rows = ((depth_z / config.grid_size).ceil() as usize).max(1);

    let mut heights: HashMap<(usize, usize), Vec<f64>> = HashMap::new();
    for p in points {
        let c = grid_index(p.x - bounds.min_x, config.grid_size, cols);
        let r = grid_index(p.z - bounds.min_z, config.grid_size, rows);
        heights.entry((c, r)).or_default().push(p.y);
    }

    let cells: BTreeMap<(usize, usize), CollisionCell> = heights
        .into_iter()
        .map(|(key, column)| {
            let floor_y = column.iter().copied().fold(f64::INFINITY, f64::min);
            let blocked = is_blocked(&column, floor_y, config);
            (
                key,
                CollisionCell {
                    y: round_to(floor_y, 3),
                    b: u8::from(blocked),
                },
            )
        })
        .collect();

    let blocked = cells.values().filter(|c| c.is_blocked()).count();
    info!(
        "Collision grid {}x{}: {} occupied cells, {} blocked",
        cols,
        rows,
        cells.len(),
        blocked
    );

    CollisionMap {
        metadata: CollisionMetadata {
            min_x: bounds.min_x,
            min_z: bounds.min_z,
            min_y: bounds.min_y,
            grid_size: config.grid_size,
            cols,
            rows,
        },
        cells,
    }
}
