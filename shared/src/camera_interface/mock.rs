use super::{CameraConfig, CameraError, CameraInterface, CameraResult};
use ndarray::Array2;
use std::time::Duration;

/// Camera that replays a fixed sequence of native-resolution frames.
///
/// Frames are indexed `[x, y]` with shape `(width, height)`, the same layout
/// the simulator produces. Binning sums `binsize x binsize` blocks.
pub struct MockCamera {
    config: CameraConfig,
    frames: Vec<Array2<f64>>,
    frame_index: usize,
    frame_count: u64,
    connected: bool,
    last_exposure: Option<Duration>,
}

impl MockCamera {
    pub fn new(config: CameraConfig, frames: Vec<Array2<f64>>) -> Self {
        Self {
            config,
            frames,
            frame_index: 0,
            frame_count: 0,
            connected: false,
            last_exposure: None,
        }
    }

    pub fn new_repeating(config: CameraConfig, frame: Array2<f64>) -> Self {
        Self::new(config, vec![frame])
    }

    pub fn new_zeros(config: CameraConfig) -> Self {
        let frame = Array2::zeros((config.width, config.height));
        Self::new_repeating(config, frame)
    }

    pub fn reset(&mut self) {
        self.frame_index = 0;
        self.frame_count = 0;
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Exposure applied to the most recent frame
    pub fn last_exposure(&self) -> Option<Duration> {
        self.last_exposure
    }

    fn next_frame(&mut self) -> CameraResult<&Array2<f64>> {
        let frame_idx = if self.frames.len() == 1 {
            0
        } else {
            if self.frame_index >= self.frames.len() {
                return Err(CameraError::CaptureError("No more frames".to_string()));
            }
            let current = self.frame_index;
            self.frame_index += 1;
            current
        };

        Ok(&self.frames[frame_idx])
    }
}

fn bin_frame(frame: &Array2<f64>, binsize: usize, shape: (usize, usize)) -> Array2<f64> {
    Array2::from_shape_fn(shape, |(i, j)| {
        let mut total = 0.0;
        for di in 0..binsize {
            for dj in 0..binsize {
                if let Some(value) = frame.get((i * binsize + di, j * binsize + dj)) {
                    total += value;
                }
            }
        }
        total
    })
}

impl CameraInterface for MockCamera {
    fn establish_connection(&mut self) -> CameraResult<()> {
        self.connected = true;
        Ok(())
    }

    fn release_connection(&mut self) -> CameraResult<()> {
        self.connected = false;
        Ok(())
    }

    fn get_config(&self) -> &CameraConfig {
        &self.config
    }

    fn get_image(
        &mut self,
        exposure: Option<Duration>,
        binsize: Option<usize>,
    ) -> CameraResult<Array2<f64>> {
        let exposure = exposure.unwrap_or(self.config.default_exposure);
        let binsize = binsize.unwrap_or(self.config.default_binsize);
        let shape = self.config.binned_shape(binsize)?;

        let frame = self.next_frame()?;
        let output = if binsize == 1 {
            frame.clone()
        } else {
            bin_frame(frame, binsize, shape)
        };

        self.last_exposure = Some(exposure);
        self.frame_count += 1;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_camera() -> MockCamera {
        let config = CameraConfig {
            name: "mock".to_string(),
            width: 8,
            height: 4,
            default_exposure: Duration::from_millis(50),
            default_binsize: 1,
            bit_depth: 16,
        };
        MockCamera::new_repeating(config, Array2::ones((8, 4)))
    }

    #[test]
    fn test_defaults_applied() {
        let mut camera = create_test_camera();
        let frame = camera.get_image(None, None).unwrap();

        assert_eq!(frame.dim(), (8, 4));
        assert_eq!(camera.last_exposure(), Some(Duration::from_millis(50)));
        assert_eq!(camera.frame_count(), 1);
    }

    #[test]
    fn test_binning_sums_blocks() {
        let mut camera = create_test_camera();
        let frame = camera
            .get_image(Some(Duration::from_millis(10)), Some(2))
            .unwrap();

        assert_eq!(frame.dim(), (4, 2));
        assert!(frame.iter().all(|&v| v == 4.0));
        assert_eq!(camera.last_exposure(), Some(Duration::from_millis(10)));
    }

    #[test]
    fn test_invalid_binsize() {
        let mut camera = create_test_camera();
        assert!(camera.get_image(None, Some(0)).is_err());
        assert_eq!(camera.frame_count(), 0);
    }

    #[test]
    fn test_sequence_exhaustion() {
        let config = CameraConfig {
            width: 2,
            height: 2,
            ..CameraConfig::simulated()
        };
        let frames = vec![Array2::zeros((2, 2)), Array2::ones((2, 2))];
        let mut camera = MockCamera::new(config, frames);

        assert_eq!(camera.get_image(None, None).unwrap()[[0, 0]], 0.0);
        assert_eq!(camera.get_image(None, None).unwrap()[[0, 0]], 1.0);
        assert!(matches!(
            camera.get_image(None, None),
            Err(CameraError::CaptureError(_))
        ));

        camera.reset();
        assert!(camera.get_image(None, None).is_ok());
    }

    #[test]
    fn test_connection_lifecycle() {
        let mut camera = create_test_camera();
        assert!(!camera.is_connected());
        camera.establish_connection().unwrap();
        assert!(camera.is_connected());
        camera.release_connection().unwrap();
        assert!(!camera.is_connected());
        assert_eq!(camera.name(), "mock");
        assert_eq!(camera.get_camera_dimensions(), (8, 4));
    }
}
