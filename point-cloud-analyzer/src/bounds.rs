/// Axis-aligned bounds tracking for points, voxels and regions
use crate::point::Point;
use rayon::prelude::*;
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Chunk size for the parallel bounds reduction
const BOUNDS_CHUNK_SIZE: usize = 25_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointCloudBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl Default for PointCloudBounds {
    fn default() -> Self {
        Self::new()
    }
}

impl PointCloudBounds {
    /// Create new bounds initialised to infinity values
    pub fn new() -> Self {
        Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
            min_z: f64::INFINITY,
            max_z: f64::NEG_INFINITY,
        }
    }

    pub fn from_min_max(min: Point, max: Point) -> Self {
        Self {
            min_x: min.x,
            max_x: max.x,
            min_y: min.y,
            max_y: max.y,
            min_z: min.z,
            max_z: max.z,
        }
    }

    /// Compute bounds of all points with a chunked parallel reduction.
    /// Returns `None` for an empty slice.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let bounds = points
            .par_chunks(BOUNDS_CHUNK_SIZE)
            .map(|chunk| {
                let mut local_bounds = PointCloudBounds::new();
                for p in chunk {
                    local_bounds.update(p.x, p.y, p.z);
                }
                local_bounds
            })
            .reduce(PointCloudBounds::new, |a, b| a.union(&b));
        Some(bounds)
    }

    /// Update bounds with a new point
    pub fn update(&mut self, x: f64, y: f64, z: f64) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
        self.min_z = self.min_z.min(z);
        self.max_z = self.max_z.max(z);
    }

    /// Smallest bounds enclosing both
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            max_x: self.max_x.max(other.max_x),
            min_y: self.min_y.min(other.min_y),
            max_y: self.max_y.max(other.max_y),
            min_z: self.min_z.min(other.min_z),
            max_z: self.max_z.max(other.max_z),
        }
    }

    /// Get world space dimensions
    pub fn dimensions(&self) -> (f64, f64, f64) {
        (
            self.max_x - self.min_x,
            self.max_y - self.min_y,
            self.max_z - self.min_z,
        )
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
            (self.min_z + self.max_z) / 2.0,
        )
    }

    /// Area of the horizontal (x, z) footprint
    pub fn footprint_area(&self) -> f64 {
        let (width, _, depth) = self.dimensions();
        width * depth
    }
}

/// Round to a fixed number of decimal places for canonical output.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Serialises as `{ "x": [min, max], "y": [...], "z": [...] }` at 2 decimals.
impl Serialize for PointCloudBounds {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Bounds", 3)?;
        state.serialize_field("x", &[round_to(self.min_x, 2), round_to(self.max_x, 2)])?;
        state.serialize_field("y", &[round_to(self.min_y, 2), round_to(self.max_y, 2)])?;
        state.serialize_field("z", &[round_to(self.min_z, 2), round_to(self.max_z, 2)])?;
        state.end()
    }
}

/// `{x, y, z}` triple rounded to 2 decimals in output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector3(pub Point);

impl Serialize for Vector3 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Vector3", 3)?;
        state.serialize_field("x", &round_to(self.0.x, 2))?;
        state.serialize_field("y", &round_to(self.0.y, 2))?;
        state.serialize_field("z", &round_to(self.0.z, 2))?;
        state.end()
    }
}
