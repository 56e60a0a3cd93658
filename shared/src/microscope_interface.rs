//! Microscope control contract
//!
//! The getter/setter surface the acquisition software drives, implemented by
//! the simulator and by hardware adapters alike. Positions and shifts are
//! plain `(x, y)` pairs in the units of the backing instrument.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced by microscope control operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MicroscopeError {
    /// Requested function mode is unknown or the operation needs another mode.
    #[error("invalid mode: {0}")]
    InvalidMode(String),

    /// Operation is not supported by this instrument.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
}

/// Result type for microscope operations
pub type MicroscopeResult<T> = Result<T, MicroscopeError>;

/// Optical configuration of the instrument
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FunctionMode {
    #[default]
    Mag1,
    Mag2,
    Lowmag,
    Samag,
    Diff,
}

impl FunctionMode {
    /// All modes, in the order the instrument reports them
    pub const ALL: [FunctionMode; 5] = [
        FunctionMode::Mag1,
        FunctionMode::Mag2,
        FunctionMode::Lowmag,
        FunctionMode::Samag,
        FunctionMode::Diff,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionMode::Mag1 => "mag1",
            FunctionMode::Mag2 => "mag2",
            FunctionMode::Lowmag => "lowmag",
            FunctionMode::Samag => "samag",
            FunctionMode::Diff => "diff",
        }
    }

    pub fn is_diffraction(&self) -> bool {
        matches!(self, FunctionMode::Diff)
    }
}

impl fmt::Display for FunctionMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FunctionMode {
    type Err = MicroscopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FunctionMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| MicroscopeError::InvalidMode(format!("Mode {s} not available")))
    }
}

/// Fluorescent screen position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenPosition {
    #[default]
    Up,
    Down,
}

/// Stage translation (x, y, z) and tilts (alpha, beta, degrees)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StagePosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub alpha_tilt: f64,
    pub beta_tilt: f64,
}

/// Partial stage move: only the `Some` fields change
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StagePositionUpdate {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub alpha_tilt: Option<f64>,
    pub beta_tilt: Option<f64>,
}

impl StagePositionUpdate {
    /// Update that moves every axis to `position`
    pub fn to(position: StagePosition) -> Self {
        Self {
            x: Some(position.x),
            y: Some(position.y),
            z: Some(position.z),
            alpha_tilt: Some(position.alpha_tilt),
            beta_tilt: Some(position.beta_tilt),
        }
    }

    /// Apply this update on top of `position`
    pub fn apply(&self, position: StagePosition) -> StagePosition {
        StagePosition {
            x: self.x.unwrap_or(position.x),
            y: self.y.unwrap_or(position.y),
            z: self.z.unwrap_or(position.z),
            alpha_tilt: self.alpha_tilt.unwrap_or(position.alpha_tilt),
            beta_tilt: self.beta_tilt.unwrap_or(position.beta_tilt),
        }
    }
}

/// Available magnifications per function mode
pub type MagnificationRanges = BTreeMap<FunctionMode, Vec<f64>>;

/// Trait for the microscope control surface
///
/// Getters and setters read and write instrument state only; none of them
/// acquires an image.
pub trait MicroscopeInterface {
    /// Open the connection to the microscope
    fn establish_connection(&mut self) -> MicroscopeResult<()>;

    /// Release the connection to the microscope
    fn release_connection(&mut self) -> MicroscopeResult<()>;

    fn get_beam_shift(&self) -> (f64, f64);
    fn set_beam_shift(&mut self, x: f64, y: f64) -> MicroscopeResult<()>;

    fn get_beam_tilt(&self) -> (f64, f64);
    fn set_beam_tilt(&mut self, x: f64, y: f64) -> MicroscopeResult<()>;

    fn get_gun_shift(&self) -> (f64, f64);
    fn set_gun_shift(&mut self, x: f64, y: f64) -> MicroscopeResult<()>;

    fn get_gun_tilt(&self) -> (f64, f64);
    fn set_gun_tilt(&mut self, x: f64, y: f64) -> MicroscopeResult<()>;

    fn get_brightness(&self) -> f64;
    fn set_brightness(&mut self, _value: f64) -> MicroscopeResult<()> {
        Err(MicroscopeError::NotImplemented("set_brightness"))
    }

    fn get_condenser_lens_stigmator(&self) -> (f64, f64);
    fn set_condenser_lens_stigmator(&mut self, x: f64, y: f64) -> MicroscopeResult<()>;

    fn get_objective_lens_stigmator(&self) -> (f64, f64);
    fn set_objective_lens_stigmator(&mut self, x: f64, y: f64) -> MicroscopeResult<()>;

    fn get_intermediate_lens_stigmator(&self) -> (f64, f64);
    fn set_intermediate_lens_stigmator(&mut self, x: f64, y: f64) -> MicroscopeResult<()>;

    /// Diffraction focus; with `confirm_mode` the instrument must be in diffraction mode
    fn get_diff_focus(&self, confirm_mode: bool) -> MicroscopeResult<f64>;
    fn set_diff_focus(&mut self, value: f64, confirm_mode: bool) -> MicroscopeResult<()>;

    fn get_diff_shift(&self) -> (f64, f64);
    fn set_diff_shift(&mut self, x: f64, y: f64) -> MicroscopeResult<()>;

    fn get_function_mode(&self) -> FunctionMode;

    /// Switch function mode by name; unknown names leave the mode unchanged
    fn set_function_mode(&mut self, mode: &str) -> MicroscopeResult<()>;

    fn get_image_shift1(&self) -> (f64, f64);
    fn set_image_shift1(&mut self, x: f64, y: f64) -> MicroscopeResult<()>;

    fn get_image_shift2(&self) -> (f64, f64);
    fn set_image_shift2(&mut self, x: f64, y: f64) -> MicroscopeResult<()>;

    fn get_magnification(&self) -> f64;
    fn set_magnification(&mut self, _value: f64) -> MicroscopeResult<()> {
        Err(MicroscopeError::NotImplemented("set_magnification"))
    }

    fn get_magnification_index(&self) -> usize;
    fn set_magnification_index(&mut self, _index: usize) -> MicroscopeResult<()> {
        Err(MicroscopeError::NotImplemented("set_magnification_index"))
    }

    fn get_magnification_absolute_index(&self) -> MicroscopeResult<usize> {
        Err(MicroscopeError::NotImplemented(
            "get_magnification_absolute_index",
        ))
    }

    fn get_magnification_ranges(&self) -> MicroscopeResult<MagnificationRanges> {
        Err(MicroscopeError::NotImplemented("get_magnification_ranges"))
    }

    fn get_ht_value(&self) -> f64;

    fn get_screen_position(&self) -> ScreenPosition;
    fn set_screen_position(&mut self, value: ScreenPosition) -> MicroscopeResult<()>;

    fn get_spot_size(&self) -> f64;
    fn set_spot_size(&mut self, _value: f64) -> MicroscopeResult<()> {
        Err(MicroscopeError::NotImplemented("set_spot_size"))
    }

    fn get_stage_position(&self) -> StagePosition;

    /// Move the stage; `wait` blocks until the move completes on real hardware
    fn set_stage_position(
        &mut self,
        update: StagePositionUpdate,
        wait: bool,
    ) -> MicroscopeResult<()>;

    fn is_stage_moving(&self) -> bool;
    fn stop_stage(&mut self) -> MicroscopeResult<()>;

    fn is_beam_blanked(&self) -> bool;
    fn set_beam_blank(&mut self, blanked: bool) -> MicroscopeResult<()>;
}
