/// Horizontal floor-plane detection over fixed-height slabs
use crate::bounds::{PointCloudBounds, round_to};
use crate::point::Point;
use constants::analysis::{
    FLOOR_BAND_FRACTION, FLOOR_BAND_MIN_HEIGHT, FLOOR_BAND_MIN_POINTS,
    FLOOR_FULL_CONFIDENCE_POINTS, FLOOR_HALF_THICKNESS, FLOOR_MAX_VARIANCE, FLOOR_MIN_AREA,
};
use serde::{Serialize, Serializer};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorPlane {
    pub normal: [f64; 3],
    pub bounds: PointCloudBounds,
    /// Mean height of the slab.
    #[serde(serialize_with = "round2")]
    pub height: f64,
    pub point_count: usize,
    pub confidence: f64,
}

fn round2<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_to(*value, 2))
}

/// Slab height for a given vertical range.
pub fn band_height(vertical_range: f64) -> f64 {
    FLOOR_BAND_MIN_HEIGHT.max(vertical_range * FLOOR_BAND_FRACTION)
}

/// Test one slab for planarity; `None` when it fails any threshold.
fn plane_from_slab(slab: &[Point]) -> Option<FloorPlane> {
    if slab.len() < FLOOR_BAND_MIN_POINTS {
        return None;
    }

    let n = slab.len() as f64;
    let mean = slab.iter().map(|p| p.y).sum::<f64>() / n;
    let variance = slab.iter().map(|p| (p.y - mean).powi(2)).sum::<f64>() / n;
    if variance >= FLOOR_MAX_VARIANCE {
        debug!("Slab at {:.2} not planar (variance {:.4})", mean, variance);
        return None;
    }

    let mut footprint = PointCloudBounds::new();
    for p in slab {
        footprint.update(p.x, mean, p.z);
    }
    if footprint.footprint_area() <= FLOOR_MIN_AREA {
        debug!(
            "Slab at {:.2} too small ({:.2} m²)",
            mean,
            footprint.footprint_area()
        );
        return None;
    }

    footprint.min_y = mean - FLOOR_HALF_THICKNESS;
    footprint.max_y = mean + FLOOR_HALF_THICKNESS;
    Some(FloorPlane {
        normal: [0.0, 1.0, 0.0],
        bounds: footprint,
        height: mean,
        point_count: slab.len(),
        confidence: (n / FLOOR_FULL_CONFIDENCE_POINTS).min(1.0),
    })
}

/// Slice `[min_y, max_y]` into slabs and emit one plane per planar slab.
pub fn detect_floor_planes(points: &[Point], scene_bounds: &PointCloudBounds) -> Vec<FloorPlane> {
    let range = scene_bounds.max_y - scene_bounds.min_y;
    let step = band_height(range);
    let bands = (range / step).floor() as usize + 1;

    let mut slabs: Vec<Vec<Point>> = vec![Vec::new(); bands];
    for p in points {
        let offset = p.y - scene_bounds.min_y;
        if offset < 0.0 {
            continue;
        }
        let band = (offset / step).floor() as usize;
        if let Some(slab) = slabs.get_mut(band) {
            slab.push(*p);
        }
    }

    let planes: Vec<FloorPlane> = slabs.iter().filter_map(|s| plane_from_slab(s)).collect();
    info!(
        "Floor detection: {} slabs of {:.2} m, {} planes",
        bands,
        step,
        planes.len()
    );
    planes
}
