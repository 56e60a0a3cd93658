//! Crystal lattice model for diffraction spot selection
//!
//! A [`Crystal`] holds a triclinic unit cell. Its reciprocal lattice is
//! enumerated up to a resolution cutoff and tested against the Ewald sphere
//! to decide which reflections are excited for a given orientation.

use std::fmt;

use nalgebra::{Matrix3, Vector3};
use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::algo::misc::nearest_index;
use crate::error::SimulationError;

/// Capability to turn a lattice orientation into a reflection mask
pub trait CrystalModel: fmt::Debug + Send {
    /// Orientation of the lattice relative to the sample frame
    fn rotation_matrix(&self) -> &Matrix3<f64>;

    /// Boolean mask over a `(rows, cols)` detector marking excited reflections
    ///
    /// The detector spans `[-1/d_min, 1/d_min]` in reciprocal space along
    /// both axes, columns along x and rows along y. `rotation_matrix` is
    /// applied on top of the lattice's own orientation.
    fn diffraction_pattern_mask(
        &self,
        shape: (usize, usize),
        d_min: f64,
        rotation_matrix: &Matrix3<f64>,
        wavelength: f64,
        excitation_error: f64,
    ) -> Array2<bool>;
}

/// Unit cell lengths (Å) and angles (degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitCell {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl UnitCell {
    /// Direct basis vectors as matrix columns, a along x and b in the xy plane
    fn direct_basis(&self) -> Result<Matrix3<f64>, SimulationError> {
        let cos_alpha = self.alpha.to_radians().cos();
        let cos_beta = self.beta.to_radians().cos();
        let (sin_gamma, cos_gamma) = self.gamma.to_radians().sin_cos();

        let cx = cos_beta;
        let cy = (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
        let cz_squared = 1.0 - cx * cx - cy * cy;
        let lengths_positive = self.a > 0.0 && self.b > 0.0 && self.c > 0.0;
        if cz_squared.is_nan() || cz_squared <= 0.0 || !lengths_positive {
            return Err(SimulationError::InvalidConfig(format!(
                "unit cell {self:?} does not span a volume"
            )));
        }

        Ok(Matrix3::from_columns(&[
            Vector3::new(self.a, 0.0, 0.0),
            Vector3::new(self.b * cos_gamma, self.b * sin_gamma, 0.0),
            Vector3::new(self.c * cx, self.c * cy, self.c * cz_squared.sqrt()),
        ]))
    }
}

/// Single-phase crystal with a fixed lattice orientation
#[derive(Debug, Clone, PartialEq)]
pub struct Crystal {
    cell: UnitCell,
    /// Reciprocal basis a*, b*, c* as columns (1/Å, no 2π factor)
    reciprocal: Matrix3<f64>,
    direct_lengths: [f64; 3],
    orientation: Matrix3<f64>,
}

impl Crystal {
    pub fn new(cell: UnitCell) -> Result<Self, SimulationError> {
        let direct = cell.direct_basis()?;
        let (a, b, c) = (direct.column(0), direct.column(1), direct.column(2));
        let volume = a.dot(&b.cross(&c));

        let reciprocal = Matrix3::from_columns(&[
            b.cross(&c) / volume,
            c.cross(&a) / volume,
            a.cross(&b) / volume,
        ]);

        Ok(Self {
            cell,
            reciprocal,
            direct_lengths: [cell.a, cell.b, cell.c],
            orientation: Matrix3::identity(),
        })
    }

    /// Random cell: lengths uniform in [5, 25) Å, then angles uniform in [80, 110) degrees
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Result<Self, SimulationError> {
        let a = rng.gen_range(5.0..25.0);
        let b = rng.gen_range(5.0..25.0);
        let c = rng.gen_range(5.0..25.0);
        let alpha = rng.gen_range(80.0..110.0);
        let beta = rng.gen_range(80.0..110.0);
        let gamma = rng.gen_range(80.0..110.0);
        Self::new(UnitCell {
            a,
            b,
            c,
            alpha,
            beta,
            gamma,
        })
    }

    pub fn with_orientation(mut self, orientation: Matrix3<f64>) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn cell(&self) -> &UnitCell {
        &self.cell
    }

    pub fn reciprocal_basis(&self) -> &Matrix3<f64> {
        &self.reciprocal
    }

    /// Reciprocal lattice vectors with `|g| <= 1 / d_min`, direct beam included
    pub fn reflections(&self, d_min: f64) -> Vec<Vector3<f64>> {
        let g_max = 1.0 / d_min;
        // h = g · a, so |h| <= |g| |a|
        let [ha, kb, lc] = self.direct_lengths.map(|length| (g_max * length).floor() as i64);

        let mut reflections = Vec::new();
        for h in -ha..=ha {
            for k in -kb..=kb {
                for l in -lc..=lc {
                    let g = self.reciprocal * Vector3::new(h as f64, k as f64, l as f64);
                    if g.norm() <= g_max {
                        reflections.push(g);
                    }
                }
            }
        }
        reflections
    }
}

/// Distance of the reciprocal lattice point `g` from the Ewald sphere
///
/// The incident wavevector is `(0, 0, 1/λ)`; positive values lie inside.
pub fn excitation_error(g: &Vector3<f64>, wavelength: f64) -> f64 {
    let k = 1.0 / wavelength;
    k - (Vector3::new(0.0, 0.0, k) + g).norm()
}

impl CrystalModel for Crystal {
    fn rotation_matrix(&self) -> &Matrix3<f64> {
        &self.orientation
    }

    fn diffraction_pattern_mask(
        &self,
        shape: (usize, usize),
        d_min: f64,
        rotation_matrix: &Matrix3<f64>,
        wavelength: f64,
        excitation_error_limit: f64,
    ) -> Array2<bool> {
        let g_max = 1.0 / d_min;
        let rotation = rotation_matrix * self.orientation;
        let mut mask = Array2::from_elem(shape, false);

        for g in self.reflections(d_min) {
            let g = rotation * g;
            if excitation_error(&g, wavelength).abs() > excitation_error_limit {
                continue;
            }
            let row = nearest_index(g.y, g_max, shape.0);
            let col = nearest_index(g.x, g_max, shape.1);
            if let (Some(row), Some(col)) = (row, col) {
                mask[[row, col]] = true;
            }
        }
        mask
    }
}
