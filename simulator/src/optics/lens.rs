//! Electromagnetic lens

use serde::{Deserialize, Serialize};

use super::beam::Beam;
use super::OpticalComponent;

/// Electromagnetic lens
///
/// Aberration coefficients are carried for the beam-shaping model but do not
/// yet alter propagation; the lens passes beams through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lens {
    /// Focal length in m
    pub focal_length: f64,
    /// Collection semi-angle in rad
    pub collection_angle: f64,
    /// Convergence semi-angle in rad
    pub convergence_angle: f64,
    /// Spherical aberration coefficient in mm
    pub spherical_aberration: f64,
    /// Chromatic aberration coefficient in mm
    pub chromatic_aberration: f64,
    /// Two-fold astigmatism along x
    pub astigmatism_x: f64,
    /// Two-fold astigmatism along y
    pub astigmatism_y: f64,
    /// Excitation offset applied through the focus control
    pub focus: f64,
}

impl Lens {
    pub fn new(
        focal_length: f64,
        collection_angle: f64,
        convergence_angle: f64,
        spherical_aberration: f64,
        chromatic_aberration: f64,
        astigmatism_x: f64,
        astigmatism_y: f64,
    ) -> Self {
        Self {
            focal_length,
            collection_angle,
            convergence_angle,
            spherical_aberration,
            chromatic_aberration,
            astigmatism_x,
            astigmatism_y,
            focus: 0.0,
        }
    }

    /// Aberration-free lens with equal collection and convergence angles
    pub fn ideal(focal_length: f64, angle: f64) -> Self {
        Self::new(focal_length, angle, angle, 0.0, 0.0, 0.0, 0.0)
    }

    pub fn astigmatism(&self) -> (f64, f64) {
        (self.astigmatism_x, self.astigmatism_y)
    }

    /// Stigmator setting, stored as the residual astigmatism
    pub fn set_astigmatism(&mut self, x: f64, y: f64) {
        self.astigmatism_x = x;
        self.astigmatism_y = y;
    }

    pub fn magnification(&self) -> f64 {
        self.collection_angle / self.convergence_angle
    }
}

impl OpticalComponent for Lens {
    fn propagate_beam(&self, beam: &Beam) -> Beam {
        beam.copy()
    }
}
