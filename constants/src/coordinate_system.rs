/// Coordinate transformation matrix (row-major: [x_new, y_new, z_new])
/// LAS/LAZ scans are Z-up; the analyzer works in a Y-up frame.
/// Default: -90° X rotation (Z→Y, -Y→Z, X→X)
pub const COORDINATE_TRANSFORM: [[f64; 3]; 3] = [
    [1.0, 0.0, 0.0],  // X = X
    [0.0, 0.0, 1.0],  // Y = Z
    [0.0, -1.0, 0.0], // Z = -Y
];

/// Apply coordinate transformation matrix to bring Z-up input into the Y-up frame.
pub fn transform_coordinates(x: f64, y: f64, z: f64) -> (f64, f64, f64) {
    let input = [x, y, z];
    let mut output = [0.0; 3];

    for i in 0..3 {
        for j in 0..3 {
            output[i] += COORDINATE_TRANSFORM[i][j] * input[j];
        }
    }

    (output[0], output[1], output[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn z_up_becomes_y_up() {
        assert_eq!(transform_coordinates(1.0, 2.0, 3.0), (1.0, 3.0, -2.0));
    }
}
