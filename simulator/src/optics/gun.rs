//! Electron source parameters and the seed beam
//!
//! Preset values follow Table 5.1 of Williams & Carter, *Transmission
//! Electron Microscopy*. The table lists values at 100 kV; the same values
//! are used for every acceleration voltage.

use serde::{Deserialize, Serialize};

use super::beam::Beam;
use super::OpticalComponent;
use crate::error::SimulationError;

/// Electron gun configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gun {
    /// Acceleration voltage in volts
    pub acceleration_voltage: f64,
    /// Energy spread in eV
    pub energy_spread: f64,
    /// Crossover diameter in meters
    pub crossover_size: f64,
    /// Brightness in A/m²/sr
    pub brightness: f64,
    /// Current density in A/m²
    pub current_density: f64,
}

impl Gun {
    pub const fn new(
        acceleration_voltage: f64,
        energy_spread: f64,
        crossover_size: f64,
        brightness: f64,
        current_density: f64,
    ) -> Self {
        Self {
            acceleration_voltage,
            energy_spread,
            crossover_size,
            brightness,
            current_density,
        }
    }

    /// Same source operated at a different acceleration voltage
    pub const fn with_acceleration_voltage(self, acceleration_voltage: f64) -> Self {
        Self {
            acceleration_voltage,
            ..self
        }
    }

    /// Reject sources whose seed beam would not be a proper ellipse
    pub fn validate(&self) -> Result<(), SimulationError> {
        if !(self.crossover_size.is_finite() && self.crossover_size > 0.0) {
            return Err(SimulationError::InvalidConfig(format!(
                "gun crossover size {} m must be positive",
                self.crossover_size
            )));
        }
        if !(self.acceleration_voltage.is_finite() && self.acceleration_voltage > 0.0) {
            return Err(SimulationError::InvalidConfig(format!(
                "acceleration voltage {} V must be positive",
                self.acceleration_voltage
            )));
        }
        Ok(())
    }

    /// Seed beam leaving the gun: a circle of the crossover diameter on the axis
    pub fn get_beam(&self) -> Beam {
        Beam::circular(self.crossover_size / 2.0, 0.0, 0.0)
    }
}

impl Default for Gun {
    fn default() -> Self {
        models::COLD_FEG
    }
}

impl OpticalComponent for Gun {
    fn propagate_beam(&self, beam: &Beam) -> Beam {
        beam.copy()
    }
}

/// Standard electron sources at 200 kV
pub mod models {
    use super::Gun;

    /// Thermionic tungsten hairpin
    pub const TUNGSTEN: Gun = Gun::new(200_000.0, 3.0, 1e-4, 1e10, 5.0);

    /// Thermionic LaB6 crystal
    pub const LAB6: Gun = Gun::new(200_000.0, 1.5, 1e-5, 5e11, 1e2);

    /// Schottky field emission gun
    pub const SCHOTTKY_FEG: Gun = Gun::new(200_000.0, 0.7, 15e-9, 5e12, 1e5);

    /// Cold field emission gun
    pub const COLD_FEG: Gun = Gun::new(200_000.0, 0.3, 3e-9, 1e13, 1e6);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_beam_is_crossover_circle() {
        let gun = models::LAB6;
        let beam = gun.get_beam();
        assert_eq!(beam.a(), 5e-6);
        assert_eq!(beam.b(), 5e-6);
        assert_eq!(beam.t(), 0.0);
        assert_eq!(beam.center(), (0.0, 0.0));
    }

    #[test]
    fn test_presets() {
        assert_eq!(models::TUNGSTEN.energy_spread, 3.0);
        assert_eq!(models::LAB6.brightness, 5e11);
        assert_eq!(models::SCHOTTKY_FEG.crossover_size, 15e-9);
        assert_eq!(models::COLD_FEG.current_density, 1e6);
        assert_eq!(Gun::default(), models::COLD_FEG);
    }

    #[test]
    fn test_validate() {
        for gun in [
            models::TUNGSTEN,
            models::LAB6,
            models::SCHOTTKY_FEG,
            models::COLD_FEG,
        ] {
            assert!(gun.validate().is_ok());
        }

        for crossover_size in [0.0, -1e-9, f64::NAN, f64::INFINITY] {
            let gun = Gun {
                crossover_size,
                ..models::COLD_FEG
            };
            assert!(matches!(
                gun.validate(),
                Err(SimulationError::InvalidConfig(_))
            ));
        }

        let gun = models::COLD_FEG.with_acceleration_voltage(f64::NAN);
        assert!(matches!(
            gun.validate(),
            Err(SimulationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_acceleration_voltage_override() {
        let gun = models::COLD_FEG.with_acceleration_voltage(300_000.0);
        assert_eq!(gun.acceleration_voltage, 300_000.0);
        assert_eq!(gun.energy_spread, models::COLD_FEG.energy_spread);
    }

    #[test]
    fn test_propagation_is_pass_through() {
        let beam = Beam::new(2.0, 1.0, 0.3, 5.0, 6.0);
        assert_eq!(models::TUNGSTEN.propagate_beam(&beam), beam);
    }
}
