/// 3D point type shared by every pipeline stage
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Build a point only if every coordinate is finite.
    pub fn finite(x: f64, y: f64, z: f64) -> Option<Self> {
        (x.is_finite() && y.is_finite() && z.is_finite()).then_some(Self { x, y, z })
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn squared_distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }
}

impl From<[f64; 3]> for Point {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_rejects_nan_and_infinity() {
        assert!(Point::finite(0.0, 1.0, 2.0).is_some());
        assert!(Point::finite(f64::NAN, 1.0, 2.0).is_none());
        assert!(Point::finite(0.0, f64::INFINITY, 2.0).is_none());
        assert!(Point::finite(0.0, 1.0, f64::NEG_INFINITY).is_none());
    }

    #[test]
    fn squared_distance_is_symmetric() {
        let a = Point::new(0.0, 0.0, 0.0);
        let b = Point::new(1.0, 2.0, 2.0);
        assert_eq!(a.squared_distance(&b), 9.0);
        assert_eq!(b.squared_distance(&a), 9.0);
    }
}
