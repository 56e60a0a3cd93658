//! Selectable aperture strip

use serde::{Deserialize, Serialize};

use super::beam::Beam;
use super::OpticalComponent;
use crate::error::SimulationError;

/// Aperture strip with several bores, one of which can be inserted.
///
/// Clipping of the beam by the selected bore is not modelled; the aperture
/// passes beams through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aperture {
    /// Position of the strip in m
    pub x: f64,
    /// Position of the strip in m
    pub y: f64,
    radii: Vec<f64>,
    index: usize,
    inserted: bool,
}

impl Aperture {
    /// Aperture at `(x, y)` offering `radii` (m), first bore selected, retracted
    pub fn new(x: f64, y: f64, radii: Vec<f64>) -> Self {
        Self {
            x,
            y,
            radii,
            index: 0,
            inserted: false,
        }
    }

    pub fn radii(&self) -> &[f64] {
        &self.radii
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Radius of the selected bore in m, `None` for a strip without bores
    pub fn radius(&self) -> Option<f64> {
        self.radii.get(self.index).copied()
    }

    pub fn select(&mut self, index: usize) -> Result<(), SimulationError> {
        if index >= self.radii.len() {
            return Err(SimulationError::ApertureIndex {
                index,
                available: self.radii.len(),
            });
        }
        self.index = index;
        Ok(())
    }

    pub fn is_inserted(&self) -> bool {
        self.inserted
    }

    pub fn insert(&mut self) {
        self.inserted = true;
    }

    pub fn retract(&mut self) {
        self.inserted = false;
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

impl OpticalComponent for Aperture {
    fn propagate_beam(&self, beam: &Beam) -> Beam {
        beam.copy()
    }
}
