use temsim_shared::camera_interface::CameraError;
use temsim_shared::microscope_interface::MicroscopeError;
use thiserror::Error;

/// Errors produced by the instrument simulation.
#[derive(Error, Debug)]
pub enum SimulationError {
    /// Requested aperture bore does not exist on the strip.
    #[error("aperture index {index} out of range ({available} bores available)")]
    ApertureIndex {
        /// Requested bore.
        index: usize,
        /// Number of bores on the strip.
        available: usize,
    },

    /// Configuration values are inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Camera-side failure, such as invalid binning.
    #[error(transparent)]
    Camera(#[from] CameraError),

    /// Microscope-side failure, such as an unknown function mode.
    #[error(transparent)]
    Microscope(#[from] MicroscopeError),
}
