/// Stair detection from consecutive floor regions sorted by height
use crate::bounds::PointCloudBounds;
use crate::classify::{ClassifiedRegion, RegionLabel};
use constants::analysis::{STAIR_RISE_RANGE, STAIR_RUN_RANGE, STAIR_SLOPE_RANGE};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StairRegion {
    pub bounds: PointCloudBounds,
    pub slope: f64,
    pub rise_run: f64,
}

fn within(value: f64, (low, high): (f64, f64)) -> bool {
    low < value && value < high
}

/// Pair each floor region with the next higher one and keep stair-like steps.
pub fn detect_stairs(regions: &[ClassifiedRegion]) -> Vec<StairRegion> {
    let mut floors: Vec<&ClassifiedRegion> = regions
        .iter()
        .filter(|r| r.label == RegionLabel::Floor)
        .collect();
    floors.sort_by(|a, b| a.bounds.center().y.total_cmp(&b.bounds.center().y));

    let stairs: Vec<StairRegion> = floors
        .windows(2)
        .filter_map(|pair| {
            let (current, next) = (pair[0].bounds.center(), pair[1].bounds.center());

            let rise = next.y - current.y;
            if !within(rise, STAIR_RISE_RANGE) {
                return None;
            }
            let run = (next.x - current.x).hypot(next.z - current.z);
            if !within(run, STAIR_RUN_RANGE) {
                return None;
            }
            let slope = rise / run;
            if !within(slope, STAIR_SLOPE_RANGE) {
                return None;
            }

            debug!("Stair step: rise {:.2}, run {:.2}", rise, run);
            Some(StairRegion {
                bounds: pair[0].bounds.union(&pair[1].bounds),
                slope,
                rise_run: slope,
            })
        })
        .collect();

    info!(
        "Stair detection: {} floor regions, {} stair steps",
        floors.len(),
        stairs.len()
    );
    stairs
}
