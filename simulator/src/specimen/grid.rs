//! Support grids holding the specimen
//!
//! A grid classifies every point of the stage plane as either solid support
//! (copper bars, rim) or open hole. Only points over a hole let the beam
//! through unobstructed.

use std::fmt;

use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};

/// Nanometres per inch, for mesh counts quoted in lines per inch
const NM_PER_INCH: f64 = 25.4e6;

/// Membership test for structural support in the stage plane
pub trait SupportGrid: fmt::Debug + Send {
    /// Whether the point `(x, y)` in nm lies on support
    fn is_support(&self, x: f64, y: f64) -> bool;

    /// Radius of the usable grid area in nm
    fn radius_nm(&self) -> f64;

    /// Element-wise [`SupportGrid::is_support`] over coordinate arrays
    fn array_from_coords(&self, x: &Array2<f64>, y: &Array2<f64>) -> Array2<bool> {
        Zip::from(x)
            .and(y)
            .map_collect(|&px, &py| self.is_support(px, py))
    }
}

/// Geometry of a square-mesh grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Outer diameter in nm
    pub diameter_nm: f64,
    /// Mesh count in lines per inch
    pub mesh: u32,
    /// Width of each bar in nm
    pub bar_width_nm: f64,
}

impl Default for GridConfig {
    /// Standard 3.05 mm, 200 mesh copper grid
    fn default() -> Self {
        Self {
            diameter_nm: 3.05e6,
            mesh: 200,
            bar_width_nm: 37_000.0,
        }
    }
}

/// Circular grid with a square mesh of bars, one hole centred on the axis
#[derive(Debug, Clone, PartialEq)]
pub struct MeshGrid {
    config: GridConfig,
    pitch_nm: f64,
}

impl MeshGrid {
    pub fn new(config: GridConfig) -> Self {
        Self {
            config,
            pitch_nm: NM_PER_INCH / config.mesh.max(1) as f64,
        }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Bar-to-bar spacing in nm
    pub fn pitch_nm(&self) -> f64 {
        self.pitch_nm
    }

    /// Bars are centred on `(k + 1/2) · pitch`
    fn on_bar(&self, u: f64) -> bool {
        let cells = u / self.pitch_nm - 0.5;
        let distance = (cells - cells.round()).abs() * self.pitch_nm;
        distance <= self.config.bar_width_nm / 2.0
    }
}

impl Default for MeshGrid {
    fn default() -> Self {
        Self::new(GridConfig::default())
    }
}

impl SupportGrid for MeshGrid {
    fn is_support(&self, x: f64, y: f64) -> bool {
        let radius = self.radius_nm();
        if x * x + y * y > radius * radius {
            return true;
        }
        self.on_bar(x) || self.on_bar(y)
    }

    fn radius_nm(&self) -> f64 {
        self.config.diameter_nm / 2.0
    }
}
