//! Goniometer stage carrying the specimen
//!
//! The stage owns the grid, the crystal prototype and the full sample
//! population. It maps detector extents into the tilted specimen plane and
//! rasterizes either a bright-field image or a diffraction pattern.

use std::f64::consts::PI;
use std::time::Instant;

use log::{debug, info, warn};
use nalgebra::{Matrix3, Vector3};
use ndarray::{Array2, Zip};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use temsim_shared::microscope_interface::{StagePosition, StagePositionUpdate};

use super::crystal::{Crystal, CrystalModel};
use super::grid::{GridConfig, MeshGrid, SupportGrid};
use super::sample::Sample;
use crate::algo::misc::meshgrid;
use crate::algo::rotation::{intersect_axial_ray, intrinsic_zxy_degrees};
use crate::error::SimulationError;

/// Added to every image pixel that lies on grid support
pub const SUPPORT_OFFSET: f64 = 1000.0;

/// Resolution cutoff in Å; the detector edge sits at `1 / D_MIN`
const D_MIN: f64 = 1.0;

/// Electron wavelength in Å used for the Ewald construction
const WAVELENGTH: f64 = 0.02;

/// Largest excitation error in 1/Å for a reflection to light up
const EXCITATION_ERROR: f64 = 0.01;

/// Parameters of the generated sample population
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub num_crystals: usize,
    /// Smallest crystal radius in nm
    pub min_crystal_size: f64,
    /// Largest crystal radius in nm
    pub max_crystal_size: f64,
    pub grid: GridConfig,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            num_crystals: 10_000,
            min_crystal_size: 100.0,
            max_crystal_size: 1000.0,
            grid: GridConfig::default(),
        }
    }
}

impl StageConfig {
    pub fn validate(&self) -> Result<(), SimulationError> {
        let sizes_valid = self.min_crystal_size.is_finite()
            && self.max_crystal_size.is_finite()
            && self.min_crystal_size >= 0.0
            && self.min_crystal_size <= self.max_crystal_size;
        if !sizes_valid {
            return Err(SimulationError::InvalidConfig(format!(
                "crystal size range [{}, {}] is not a valid interval",
                self.min_crystal_size, self.max_crystal_size
            )));
        }
        if !(self.grid.diameter_nm.is_finite() && self.grid.diameter_nm > 0.0) {
            return Err(SimulationError::InvalidConfig(format!(
                "grid diameter {} nm must be positive",
                self.grid.diameter_nm
            )));
        }
        if self.grid.mesh == 0 {
            return Err(SimulationError::InvalidConfig(
                "grid mesh count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Uniform variate on `[low, high)`, one draw per call even for an empty interval
fn uniform<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64) -> f64 {
    low + (high - low) * rng.gen::<f64>()
}

#[derive(Debug)]
pub struct Stage {
    x: f64,
    y: f64,
    z: f64,
    alpha_tilt: f64,
    beta_tilt: f64,
    in_plane_rotation: f64,
    rotation_matrix: Matrix3<f64>,
    origin: Vector3<f64>,
    grid: Box<dyn SupportGrid>,
    crystal: Box<dyn CrystalModel>,
    samples: Vec<Sample>,
}

impl Stage {
    /// Generate a stage population from `rng`
    ///
    /// The crystal prototype is drawn first, then every sample as
    /// x, y, r, phi1, psi, phi2.
    pub fn new<R: Rng + ?Sized>(
        config: &StageConfig,
        rng: &mut R,
    ) -> Result<Self, SimulationError> {
        config.validate()?;

        let grid = MeshGrid::new(config.grid);
        let crystal = Crystal::random(rng)?;
        let radius = grid.radius_nm();

        let samples: Vec<Sample> = (0..config.num_crystals)
            .map(|_| {
                let x = uniform(rng, -radius, radius);
                let y = uniform(rng, -radius, radius);
                let r = uniform(rng, config.min_crystal_size, config.max_crystal_size);
                let phi1 = uniform(rng, 0.0, 2.0 * PI);
                let psi = uniform(rng, 0.0, PI);
                let phi2 = uniform(rng, 0.0, 2.0 * PI);
                Sample::new(x, y, r, phi1, psi, phi2)
            })
            .collect();

        info!(
            "Generated {} crystals ({:.0}-{:.0} nm) on a {:.2} mm grid",
            samples.len(),
            config.min_crystal_size,
            config.max_crystal_size,
            2.0 * radius * 1e-6
        );

        Ok(Self::from_parts(Box::new(grid), Box::new(crystal), samples))
    }

    /// Generate a stage population from a seeded ChaCha8 stream
    pub fn with_seed(config: &StageConfig, seed: u64) -> Result<Self, SimulationError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Self::new(config, &mut rng)
    }

    /// Stage at the home position holding an explicit grid, crystal and population
    pub fn from_parts(
        grid: Box<dyn SupportGrid>,
        crystal: Box<dyn CrystalModel>,
        samples: Vec<Sample>,
    ) -> Self {
        let mut stage = Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            alpha_tilt: 0.0,
            beta_tilt: 0.0,
            in_plane_rotation: 0.0,
            rotation_matrix: Matrix3::identity(),
            origin: Vector3::zeros(),
            grid,
            crystal,
            samples,
        };
        stage.update_rotation();
        stage
    }

    fn update_rotation(&mut self) {
        self.rotation_matrix =
            intrinsic_zxy_degrees(self.in_plane_rotation, self.alpha_tilt, self.beta_tilt);
    }

    /// Move the axes named in `update`; the rotation is rebuilt on every call
    pub fn set_position(&mut self, update: StagePositionUpdate) {
        let position = update.apply(self.position());
        self.x = position.x;
        self.y = position.y;
        self.z = position.z;
        self.alpha_tilt = position.alpha_tilt;
        self.beta_tilt = position.beta_tilt;
        self.update_rotation();
    }

    /// Rotation about the optical axis in degrees
    pub fn set_in_plane_rotation(&mut self, degrees: f64) {
        self.in_plane_rotation = degrees;
        self.update_rotation();
    }

    pub fn in_plane_rotation(&self) -> f64 {
        self.in_plane_rotation
    }

    pub fn position(&self) -> StagePosition {
        StagePosition {
            x: self.x,
            y: self.y,
            z: self.z,
            alpha_tilt: self.alpha_tilt,
            beta_tilt: self.beta_tilt,
        }
    }

    pub fn rotation_matrix(&self) -> &Matrix3<f64> {
        &self.rotation_matrix
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn crystal(&self) -> &dyn CrystalModel {
        self.crystal.as_ref()
    }

    pub fn grid(&self) -> &dyn SupportGrid {
        self.grid.as_ref()
    }

    /// Project a `(rows, cols)` raster of the image plane onto the specimen
    ///
    /// Each raster point casts a ray along +z onto the tilted stage plane;
    /// the hit is returned in the stage's own untilted frame. A plane
    /// parallel to the rays yields non-finite coordinates.
    pub fn image_extent_to_sample_coordinates(
        &self,
        shape: (usize, usize),
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
    ) -> (Array2<f64>, Array2<f64>) {
        if x_max <= x_min || y_max <= y_min {
            warn!("Degenerate image extent x [{x_min}, {x_max}], y [{y_min}, {y_max}]");
        }

        let (image_x, image_y) = meshgrid(shape, x_min, x_max, y_min, y_max);
        let normal = self.rotation_matrix * Vector3::z();
        let to_stage = self.rotation_matrix.transpose();

        let mut x = Array2::zeros(shape);
        let mut y = Array2::zeros(shape);
        Zip::from(&mut x)
            .and(&mut y)
            .and(&image_x)
            .and(&image_y)
            .for_each(|sx, sy, &ix, &iy| {
                let hit = intersect_axial_ray(&Vector3::new(ix, iy, 0.0), &self.origin, &normal);
                let local = to_stage * hit;
                *sx = local.x;
                *sy = local.y;
            });
        (x, y)
    }

    /// Bright-field raster over the given extent (nm)
    ///
    /// Pixels inside a sample carry that sample's index; pixels on grid
    /// support additionally carry [`SUPPORT_OFFSET`]. Indices of 1000 and
    /// above are indistinguishable from the support offset.
    pub fn get_image(
        &self,
        shape: (usize, usize),
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
    ) -> Array2<f64> {
        let start = Instant::now();
        let (x, y) = self.image_extent_to_sample_coordinates(shape, x_min, x_max, y_min, y_max);
        let support = self.grid.array_from_coords(&x, &y);

        // Loose cull around the stage position, not an exact visibility test
        let cutoff = 1.5 * (x_max - x_min).powi(2);
        let mut data = Array2::zeros(shape);
        let mut drawn = 0usize;
        for (index, sample) in self.samples.iter().enumerate() {
            if (sample.x - self.x).powi(2) + (sample.y - self.y).powi(2) > cutoff {
                continue;
            }
            drawn += 1;
            let value = index as f64;
            Zip::from(&mut data)
                .and(&x)
                .and(&y)
                .for_each(|pixel, &px, &py| {
                    if sample.contains(px, py) {
                        *pixel = value;
                    }
                });
        }

        Zip::from(&mut data).and(&support).for_each(|pixel, &on_support| {
            if on_support {
                *pixel += SUPPORT_OFFSET;
            }
        });

        debug!(
            "Rendered image {:?} over x [{:.3e}, {:.3e}] y [{:.3e}, {:.3e}], {} samples drawn in {:?}",
            shape,
            x_min,
            x_max,
            y_min,
            y_max,
            drawn,
            start.elapsed()
        );
        data
    }

    /// Diffraction pattern from every sample over a hole within the extent (nm)
    ///
    /// Excited reflections are weighted by `1 / (3 k² + 1)` on a reciprocal
    /// grid spanning `[-1/d_min, 1/d_min]`; all other pixels are zero.
    pub fn get_diffraction_pattern(
        &self,
        shape: (usize, usize),
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
    ) -> Array2<f64> {
        let start = Instant::now();
        let (x, y) = self.image_extent_to_sample_coordinates(shape, x_min, x_max, y_min, y_max);
        let support = self.grid.array_from_coords(&x, &y);

        let mut reflections = Array2::from_elem(shape, false);
        let mut diffracting = 0usize;
        for sample in &self.samples {
            if !sample.is_in_rectangle(x_min, x_max, y_min, y_max) {
                continue;
            }

            // Skip crystals resting entirely on support, including those covering no pixel
            let inside = sample.pixel_contains_crystal(&x, &y);
            let on_support = Zip::from(&inside)
                .and(&support)
                .all(|&inside, &on_support| !inside || on_support);
            if on_support {
                continue;
            }

            diffracting += 1;
            let rotation = self.rotation_matrix * sample.rotation_matrix();
            let mask = self.crystal.diffraction_pattern_mask(
                shape,
                D_MIN,
                &rotation,
                WAVELENGTH,
                EXCITATION_ERROR,
            );
            Zip::from(&mut reflections)
                .and(&mask)
                .for_each(|hit, &spot| *hit |= spot);
        }

        let k_max = 1.0 / D_MIN;
        let (kx, ky) = meshgrid(shape, -k_max, k_max, -k_max, k_max);
        let pattern = Zip::from(&kx)
            .and(&ky)
            .and(&reflections)
            .map_collect(|&kx, &ky, &hit| {
                if hit {
                    1.0 / (3.0 * (kx * kx + ky * ky) + 1.0)
                } else {
                    0.0
                }
            });

        debug!(
            "Rendered diffraction {:?} over x [{:.3e}, {:.3e}] y [{:.3e}, {:.3e}], {} crystals diffracting in {:?}",
            shape,
            x_min,
            x_max,
            y_min,
            y_max,
            diffracting,
            start.elapsed()
        );
        pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specimen::crystal::UnitCell;
    use approx::assert_relative_eq;

    fn cubic_crystal() -> Box<dyn CrystalModel> {
        Box::new(
            Crystal::new(UnitCell {
                a: 2.0,
                b: 2.0,
                c: 2.0,
                alpha: 90.0,
                beta: 90.0,
                gamma: 90.0,
            })
            .unwrap(),
        )
    }

    fn stage_with(samples: Vec<Sample>) -> Stage {
        Stage::from_parts(Box::new(MeshGrid::default()), cubic_crystal(), samples)
    }

    fn small_config(num_crystals: usize) -> StageConfig {
        StageConfig {
            num_crystals,
            ..StageConfig::default()
        }
    }

    #[test]
    fn test_seeded_population_is_reproducible() {
        let first = Stage::with_seed(&small_config(50), 100).unwrap();
        let second = Stage::with_seed(&small_config(50), 100).unwrap();
        assert_eq!(first.samples(), second.samples());
        assert_eq!(first.crystal().rotation_matrix(), second.crystal().rotation_matrix());

        let other = Stage::with_seed(&small_config(50), 101).unwrap();
        assert_ne!(first.samples(), other.samples());
    }

    #[test]
    fn test_population_ranges() {
        let config = small_config(200);
        let stage = Stage::with_seed(&config, 3).unwrap();
        let radius = stage.grid().radius_nm();

        assert_eq!(stage.samples().len(), 200);
        for sample in stage.samples() {
            assert!(sample.x.abs() <= radius && sample.y.abs() <= radius);
            assert!(sample.r >= config.min_crystal_size && sample.r <= config.max_crystal_size);
            assert!((0.0..=2.0 * PI).contains(&sample.euler_angle_phi_1));
            assert!((0.0..=PI).contains(&sample.euler_angle_psi));
            assert!((0.0..=2.0 * PI).contains(&sample.euler_angle_phi_2));
        }
    }

    #[test]
    fn test_equal_size_bounds_allowed() {
        let config = StageConfig {
            num_crystals: 5,
            min_crystal_size: 250.0,
            max_crystal_size: 250.0,
            ..StageConfig::default()
        };
        let stage = Stage::with_seed(&config, 1).unwrap();
        assert!(stage.samples().iter().all(|sample| sample.r == 250.0));
    }

    #[test]
    fn test_inverted_size_bounds_rejected() {
        let config = StageConfig {
            min_crystal_size: 500.0,
            max_crystal_size: 100.0,
            ..small_config(1)
        };
        assert!(matches!(
            Stage::with_seed(&config, 1),
            Err(SimulationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_set_position_is_partial_and_rebuilds_rotation() {
        let mut stage = stage_with(Vec::new());
        assert_relative_eq!(*stage.rotation_matrix(), Matrix3::identity());

        stage.set_position(StagePositionUpdate {
            x: Some(5.0),
            alpha_tilt: Some(30.0),
            ..Default::default()
        });
        stage.set_position(StagePositionUpdate {
            beta_tilt: Some(-10.0),
            ..Default::default()
        });

        let position = stage.position();
        assert_eq!(position.x, 5.0);
        assert_eq!(position.y, 0.0);
        assert_eq!(position.alpha_tilt, 30.0);
        assert_eq!(position.beta_tilt, -10.0);
        assert_relative_eq!(
            *stage.rotation_matrix(),
            intrinsic_zxy_degrees(0.0, 30.0, -10.0),
            epsilon = 1e-12
        );

        assert_eq!(stage.in_plane_rotation(), 0.0);
        stage.set_in_plane_rotation(45.0);
        assert_eq!(stage.in_plane_rotation(), 45.0);
        assert_relative_eq!(
            *stage.rotation_matrix(),
            intrinsic_zxy_degrees(45.0, 30.0, -10.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_untilted_projection_is_identity() {
        let stage = stage_with(Vec::new());
        let (x, y) = stage.image_extent_to_sample_coordinates((3, 5), -2.0, 2.0, 10.0, 20.0);
        assert_eq!(x.dim(), (3, 5));
        assert_relative_eq!(x[[0, 0]], -2.0);
        assert_relative_eq!(x[[2, 4]], 2.0);
        assert_relative_eq!(x[[1, 1]], -1.0);
        assert_relative_eq!(y[[0, 3]], 10.0);
        assert_relative_eq!(y[[2, 0]], 20.0);
    }

    #[test]
    fn test_alpha_tilt_stretches_y() {
        let mut stage = stage_with(Vec::new());
        stage.set_position(StagePositionUpdate {
            alpha_tilt: Some(60.0),
            ..Default::default()
        });
        let (x, y) = stage.image_extent_to_sample_coordinates((3, 3), -1.0, 1.0, -1.0, 1.0);
        // Foreshortening by cos(60°) is undone in the specimen frame
        assert_relative_eq!(x[[2, 2]], 1.0, epsilon = 1e-12);
        assert_relative_eq!(y[[2, 2]], 2.0, epsilon = 1e-12);
        assert_relative_eq!(y[[0, 1]], -2.0, epsilon = 1e-12);
        assert_relative_eq!(y[[1, 0]], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_image_marks_sample_index() {
        let far = Sample::new(1.0e6, 1.0e6, 1.0, 0.0, 0.0, 0.0);
        let centred = Sample::new(0.0, 0.0, 6.0, 0.0, 0.0, 0.0);
        let stage = stage_with(vec![far, centred]);

        let image = stage.get_image((5, 5), -10.0, 10.0, -10.0, 10.0);
        // Pixels sit on a 5 nm lattice; the hole at the origin has no support
        assert_eq!(image[[2, 2]], 1.0);
        assert_eq!(image[[2, 1]], 1.0);
        assert_eq!(image[[1, 2]], 1.0);
        assert_eq!(image[[1, 1]], 0.0);
        assert_eq!(image[[0, 0]], 0.0);
    }

    #[test]
    fn test_image_support_offset() {
        let far = Sample::new(-1.0e6, 0.0, 1.0, 0.0, 0.0, 0.0);
        let on_bar = Sample::new(63_500.0, 0.0, 300.0, 0.0, 0.0, 0.0);
        let mut stage = stage_with(vec![far, on_bar]);
        let extent = (63_000.0, 64_000.0, -500.0, 500.0);

        // The cull is centred on the stage position, far from the bar
        let image = stage.get_image((5, 5), extent.0, extent.1, extent.2, extent.3);
        assert!(image.iter().all(|&value| value == SUPPORT_OFFSET));

        stage.set_position(StagePositionUpdate {
            x: Some(63_500.0),
            ..Default::default()
        });
        let image = stage.get_image((5, 5), extent.0, extent.1, extent.2, extent.3);
        assert_eq!(image[[2, 2]], 1.0 + SUPPORT_OFFSET);
        assert_eq!(image[[0, 0]], SUPPORT_OFFSET);
        assert!(image.iter().all(|&value| value >= SUPPORT_OFFSET));
    }

    #[test]
    fn test_diffraction_from_crystal_over_hole() {
        let stage = stage_with(vec![Sample::new(0.0, 0.0, 100.0, 0.0, 0.0, 0.0)]);
        let pattern = stage.get_diffraction_pattern((5, 5), -10.0, 10.0, -10.0, 10.0);

        assert_relative_eq!(pattern[[2, 2]], 1.0);
        assert_relative_eq!(pattern[[2, 3]], 1.0 / 1.75);
        assert_relative_eq!(pattern[[0, 2]], 1.0 / 4.0);
        assert_eq!(pattern[[0, 0]], 0.0);
        assert_eq!(pattern.iter().filter(|&&value| value > 0.0).count(), 13);
    }

    #[test]
    fn test_diffraction_skips_supported_and_distant_crystals() {
        let on_bar = Sample::new(63_500.0, 0.0, 300.0, 0.0, 0.0, 0.0);
        let stage = stage_with(vec![on_bar]);
        let pattern = stage.get_diffraction_pattern((5, 5), 63_000.0, 64_000.0, -500.0, 500.0);
        assert!(pattern.iter().all(|&value| value == 0.0));

        let pattern = stage.get_diffraction_pattern((5, 5), -10.0, 10.0, -10.0, 10.0);
        assert!(pattern.iter().all(|&value| value == 0.0));
    }

    #[test]
    fn test_diffraction_skips_crystal_covering_no_pixel() {
        // Overlaps the extent but falls between raster points
        let tiny = Sample::new(2.5, 2.5, 0.5, 0.0, 0.0, 0.0);
        let stage = stage_with(vec![tiny]);
        let pattern = stage.get_diffraction_pattern((5, 5), -10.0, 10.0, -10.0, 10.0);
        assert!(pattern.iter().all(|&value| value == 0.0));
    }

    #[test]
    fn test_right_angle_tilt_diverges() {
        let mut stage = stage_with(Vec::new());
        stage.set_position(StagePositionUpdate {
            alpha_tilt: Some(90.0),
            ..Default::default()
        });
        let (_, y) = stage.image_extent_to_sample_coordinates((3, 3), -1.0, 1.0, -1.0, 1.0);
        // The stage normal is perpendicular to the beam up to rounding
        assert!(y[[0, 0]].abs() > 1e12 || !y[[0, 0]].is_finite());
        assert!(y[[2, 0]].abs() > 1e12 || !y[[2, 0]].is_finite());

        // Diverging points fall outside the rim and read as support
        let image = stage.get_image((3, 3), -1.0, 1.0, -1.0, 1.0);
        assert!(image[[0, 1]] >= SUPPORT_OFFSET);
    }
}
