//! Beam deflector coils

use serde::{Deserialize, Serialize};

use super::beam::Beam;
use super::OpticalComponent;

/// Deflector pair that places the beam centre at its `(x, y)` setting.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Deflector {
    pub x: f64,
    pub y: f64,
}

impl Deflector {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    pub fn set_position(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }
}

impl OpticalComponent for Deflector {
    /// Recentre the beam on the deflector setting; the shape is unchanged
    fn propagate_beam(&self, beam: &Beam) -> Beam {
        beam.with_center(self.x, self.y)
    }
}
