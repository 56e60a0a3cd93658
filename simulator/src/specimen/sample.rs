//! Individual crystallites scattered over the grid

use nalgebra::Matrix3;
use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};

use crate::algo::rotation::euler_zxz;

/// A circular crystallite lying in the stage plane
///
/// Lengths are in nm, Euler angles in radians (Z-X-Z).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SampleRecord", into = "SampleRecord")]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub r: f64,
    pub euler_angle_phi_1: f64,
    pub euler_angle_psi: f64,
    pub euler_angle_phi_2: f64,
    /// Index into the list of crystal prototypes
    pub crystal_index: usize,
    rotation_matrix: Matrix3<f64>,
}

/// Serialized form; the orientation matrix is rebuilt on load
#[derive(Serialize, Deserialize)]
struct SampleRecord {
    x: f64,
    y: f64,
    r: f64,
    euler_angle_phi_1: f64,
    euler_angle_psi: f64,
    euler_angle_phi_2: f64,
    #[serde(default)]
    crystal_index: usize,
}

impl From<SampleRecord> for Sample {
    fn from(record: SampleRecord) -> Self {
        let mut sample = Sample::new(
            record.x,
            record.y,
            record.r,
            record.euler_angle_phi_1,
            record.euler_angle_psi,
            record.euler_angle_phi_2,
        );
        sample.crystal_index = record.crystal_index;
        sample
    }
}

impl From<Sample> for SampleRecord {
    fn from(sample: Sample) -> Self {
        Self {
            x: sample.x,
            y: sample.y,
            r: sample.r,
            euler_angle_phi_1: sample.euler_angle_phi_1,
            euler_angle_psi: sample.euler_angle_psi,
            euler_angle_phi_2: sample.euler_angle_phi_2,
            crystal_index: sample.crystal_index,
        }
    }
}

impl Sample {
    pub fn new(
        x: f64,
        y: f64,
        r: f64,
        euler_angle_phi_1: f64,
        euler_angle_psi: f64,
        euler_angle_phi_2: f64,
    ) -> Self {
        Self {
            x,
            y,
            r,
            euler_angle_phi_1,
            euler_angle_psi,
            euler_angle_phi_2,
            crystal_index: 0,
            rotation_matrix: euler_zxz(euler_angle_phi_1, euler_angle_psi, euler_angle_phi_2),
        }
    }

    /// Orientation of the crystallite, fixed at construction
    pub fn rotation_matrix(&self) -> &Matrix3<f64> {
        &self.rotation_matrix
    }

    /// Strict disc membership: `(x - sx)² + (y - sy)² < r²`
    pub fn contains(&self, x: f64, y: f64) -> bool {
        (x - self.x).powi(2) + (y - self.y).powi(2) < self.r * self.r
    }

    /// Element-wise [`Sample::contains`] over coordinate arrays of equal shape
    pub fn pixel_contains_crystal(&self, x: &Array2<f64>, y: &Array2<f64>) -> Array2<bool> {
        Zip::from(x)
            .and(y)
            .map_collect(|&px, &py| self.contains(px, py))
    }

    /// Whether the bounding box of the disc overlaps the given rectangle
    pub fn is_in_rectangle(&self, x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> bool {
        self.x + self.r >= x_min
            && self.x - self.r <= x_max
            && self.y + self.r >= y_min
            && self.y - self.r <= y_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_membership_is_strict() {
        let sample = Sample::new(10.0, -5.0, 2.0, 0.0, 0.0, 0.0);
        assert!(sample.contains(10.0, -5.0));
        assert!(sample.contains(11.9, -5.0));
        assert!(!sample.contains(12.0, -5.0));
        assert!(!sample.contains(10.0, -2.0));
    }

    #[test]
    fn test_pixel_mask_matches_pointwise_test() {
        let sample = Sample::new(0.0, 0.0, 1.5, 0.0, 0.0, 0.0);
        let x = array![[-2.0, -1.0, 0.0], [1.0, 2.0, 0.5]];
        let y = array![[0.0, 0.0, 0.0], [1.0, 0.0, -1.0]];

        let mask = sample.pixel_contains_crystal(&x, &y);
        assert_eq!(mask, array![[false, true, true], [true, false, true]]);
    }

    #[test]
    fn test_rectangle_overlap() {
        let sample = Sample::new(0.0, 0.0, 1.0, 0.0, 0.0, 0.0);
        assert!(sample.is_in_rectangle(-0.5, 0.5, -0.5, 0.5));
        assert!(sample.is_in_rectangle(0.9, 5.0, -1.0, 1.0));
        assert!(!sample.is_in_rectangle(1.1, 5.0, -1.0, 1.0));
        assert!(!sample.is_in_rectangle(-1.0, 1.0, -5.0, -1.5));
    }

    #[test]
    fn test_rotation_matrix_from_angles() {
        let sample = Sample::new(0.0, 0.0, 1.0, FRAC_PI_2, 0.0, 0.0);
        let expected = euler_zxz(FRAC_PI_2, 0.0, 0.0);
        assert_relative_eq!(*sample.rotation_matrix(), expected);
        // Passive rotation: the x axis maps onto -y in the crystal frame
        assert_relative_eq!(sample.rotation_matrix()[(1, 0)], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_serde_rebuilds_rotation() {
        let mut sample = Sample::new(3.0, 4.0, 5.0, 0.1, 0.2, 0.3);
        sample.crystal_index = 2;
        let json = serde_json::to_string(&sample).unwrap();
        assert!(!json.contains("rotation_matrix"));
        let back: Sample = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample);
    }
}
