//! Camera abstraction layer for the acquisition pipeline
//!
//! Provides a unified interface for detector operations that can be backed by
//! either the TEM simulator (for testing and calibration) or a real camera.

pub mod mock;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::time::Duration;

/// Error type for camera operations
#[derive(Debug)]
pub enum CameraError {
    /// Hardware communication error
    HardwareError(String),
    /// Frame capture error
    CaptureError(String),
    /// Configuration error (binning, dimensions, exposure)
    ConfigError(String),
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CameraError::HardwareError(msg) => write!(f, "Hardware error: {msg}"),
            CameraError::CaptureError(msg) => write!(f, "Capture error: {msg}"),
            CameraError::ConfigError(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl Error for CameraError {}

/// Result type for camera operations
pub type CameraResult<T> = Result<T, CameraError>;

/// Configuration for camera initialization
///
/// Carries the native sensor geometry and the defaults applied when an image
/// request leaves exposure or binning unspecified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Camera name/identifier
    pub name: String,
    /// Native sensor width in pixels
    pub width: usize,
    /// Native sensor height in pixels
    pub height: usize,
    /// Exposure used when a request does not specify one
    pub default_exposure: Duration,
    /// Binning factor used when a request does not specify one
    pub default_binsize: usize,
    /// ADC bit depth (8, 12, 14, 16 bits typical)
    pub bit_depth: u8,
}

impl CameraConfig {
    /// Configuration of the simulated detector: 1024x1024, 100 ms, no binning
    pub fn simulated() -> Self {
        Self {
            name: "simulate".to_string(),
            width: 1024,
            height: 1024,
            default_exposure: Duration::from_millis(100),
            default_binsize: 1,
            bit_depth: 16,
        }
    }

    /// Shape of a frame binned by `binsize`, as `(width / binsize, height / binsize)`
    ///
    /// Dimensions are floor-divided. Fails for a zero binsize or one that
    /// would leave an empty frame.
    pub fn binned_shape(&self, binsize: usize) -> CameraResult<(usize, usize)> {
        if binsize == 0 {
            return Err(CameraError::ConfigError(
                "binsize must be at least 1".to_string(),
            ));
        }

        let shape = (self.width / binsize, self.height / binsize);
        if shape.0 == 0 || shape.1 == 0 {
            return Err(CameraError::ConfigError(format!(
                "binsize {binsize} exceeds sensor dimensions ({}x{})",
                self.width, self.height
            )));
        }

        Ok(shape)
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self::simulated()
    }
}

/// Trait for unified camera interface
///
/// This trait abstracts camera operations so that the acquisition pipeline can
/// run against the simulator and real hardware through the same calls.
pub trait CameraInterface {
    /// Open the connection to the camera
    fn establish_connection(&mut self) -> CameraResult<()>;

    /// Release the connection to the camera
    fn release_connection(&mut self) -> CameraResult<()>;

    /// Get camera configuration
    fn get_config(&self) -> &CameraConfig;

    /// Get camera name/identifier
    fn name(&self) -> &str {
        &self.get_config().name
    }

    /// Native sensor dimensions as `(width, height)`
    fn get_camera_dimensions(&self) -> (usize, usize) {
        let config = self.get_config();
        (config.width, config.height)
    }

    /// Whether the camera can deliver frames continuously
    fn is_streamable(&self) -> bool {
        false
    }

    /// Acquire a single frame
    ///
    /// # Arguments
    /// * `exposure` - Exposure duration, the configured default when `None`
    /// * `binsize` - Binning factor, the configured default when `None`
    ///
    /// # Returns
    /// * `Ok(frame)` with shape `(width / binsize, height / binsize)`
    /// * `Err(CameraError)` if the binning is invalid or capture fails
    fn get_image(
        &mut self,
        exposure: Option<Duration>,
        binsize: Option<usize>,
    ) -> CameraResult<Array2<f64>>;
}

impl CameraInterface for Box<dyn CameraInterface> {
    fn establish_connection(&mut self) -> CameraResult<()> {
        (**self).establish_connection()
    }

    fn release_connection(&mut self) -> CameraResult<()> {
        (**self).release_connection()
    }

    fn get_config(&self) -> &CameraConfig {
        (**self).get_config()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn get_camera_dimensions(&self) -> (usize, usize) {
        (**self).get_camera_dimensions()
    }

    fn is_streamable(&self) -> bool {
        (**self).is_streamable()
    }

    fn get_image(
        &mut self,
        exposure: Option<Duration>,
        binsize: Option<usize>,
    ) -> CameraResult<Array2<f64>> {
        (**self).get_image(exposure, binsize)
    }
}
