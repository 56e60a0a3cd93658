//! Simulated transmission electron microscope with an attached camera
//!
//! [`TemSimulation`] owns the illumination system, the stage and the
//! post-sample optics, and exposes them through the same microscope and
//! camera contracts the acquisition software uses for real hardware.

use std::time::Duration;

use log::{debug, info};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use temsim_shared::camera_interface::{CameraConfig, CameraInterface, CameraResult};
use temsim_shared::microscope_interface::{
    FunctionMode, MicroscopeError, MicroscopeInterface, MicroscopeResult, ScreenPosition,
    StagePosition, StagePositionUpdate,
};

use crate::error::SimulationError;
use crate::optics::{
    Aperture, ApertureId, Beam, Deflector, DeflectorId, Gun, Illumination, Lens, LensId,
    OpticalChain, OpticalComponent,
};
use crate::specimen::{Stage, StageConfig};

/// Focal length in m shared by every lens of the simulated column
const LENS_FOCAL_LENGTH: f64 = 0.1;

/// Collection and convergence semi-angle in rad of every lens
const LENS_ANGLE: f64 = 0.01;

/// Bore radii in m offered by every aperture strip
const APERTURE_RADII: [f64; 2] = [0.1, 0.01];

/// Everything needed to build a [`TemSimulation`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub camera: CameraConfig,
    pub stage: StageConfig,
    pub gun: Gun,
    /// Seed of the sample population
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::simulated(),
            stage: StageConfig::default(),
            gun: Gun::default(),
            seed: 100,
        }
    }
}

/// The three selectable aperture strips of the column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApertureSlot {
    Condenser,
    Objective,
    SelectedArea,
}

#[derive(Debug)]
pub struct TemSimulation {
    config: SimulationConfig,
    mode: FunctionMode,
    illumination: Illumination,
    stage: Stage,
    post_sample: OpticalChain,

    gun_shift_deflector: DeflectorId,
    condenser_lens_1: LensId,
    condenser_aperture: ApertureId,
    beam_shift_deflector: DeflectorId,

    objective_lens: LensId,
    objective_aperture: ApertureId,
    image_shift_deflector: DeflectorId,
    selected_area_aperture: ApertureId,
    intermediate_lens: LensId,

    beam_tilt: (f64, f64),
    gun_tilt: (f64, f64),
    image_shift2: (f64, f64),
    screen_position: ScreenPosition,
    beam_blanked: bool,
}

impl TemSimulation {
    /// Build the column and generate the stage population from `config.seed`
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        let stage = Stage::with_seed(&config.stage, config.seed)?;
        Self::with_stage(config, stage)
    }

    /// Build the column around an existing stage
    pub fn with_stage(config: SimulationConfig, stage: Stage) -> Result<Self, SimulationError> {
        config.camera.binned_shape(config.camera.default_binsize)?;
        config.gun.validate()?;

        let lens = || Lens::ideal(LENS_FOCAL_LENGTH, LENS_ANGLE);
        let aperture = || Aperture::new(0.0, 0.0, APERTURE_RADII.to_vec());

        let mut pre_sample = OpticalChain::new();
        let gun_shift_deflector = pre_sample.push_deflector(Deflector::default());
        let condenser_lens_1 = pre_sample.push_lens(lens());
        pre_sample.push_lens(lens());
        let condenser_aperture = pre_sample.push_aperture(aperture());
        let beam_shift_deflector = pre_sample.push_deflector(Deflector::default());

        let mut post_sample = OpticalChain::new();
        let objective_lens = post_sample.push_lens(lens());
        let objective_aperture = post_sample.push_aperture(aperture());
        let image_shift_deflector = post_sample.push_deflector(Deflector::default());
        let selected_area_aperture = post_sample.push_aperture(aperture());
        let intermediate_lens = post_sample.push_lens(lens());
        post_sample.push_lens(lens());

        info!(
            "Simulated TEM at {:.0} kV with a {}x{} camera and {} crystals",
            config.gun.acceleration_voltage / 1e3,
            config.camera.width,
            config.camera.height,
            stage.samples().len()
        );

        Ok(Self {
            illumination: Illumination::new(config.gun, pre_sample),
            config,
            mode: FunctionMode::default(),
            stage,
            post_sample,
            gun_shift_deflector,
            condenser_lens_1,
            condenser_aperture,
            beam_shift_deflector,
            objective_lens,
            objective_aperture,
            image_shift_deflector,
            selected_area_aperture,
            intermediate_lens,
            beam_tilt: (0.0, 0.0),
            gun_tilt: (0.0, 0.0),
            image_shift2: (0.0, 0.0),
            screen_position: ScreenPosition::default(),
            beam_blanked: false,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    pub fn gun(&self) -> &Gun {
        &self.illumination.gun
    }

    /// Beam footprint in the specimen plane
    pub fn beam_on_stage(&self) -> Beam {
        self.illumination.get_beam_on_stage()
    }

    /// Beam footprint on the detector, after the post-sample optics
    pub fn beam_on_detector(&self) -> Beam {
        self.post_sample.propagate_beam(&self.beam_on_stage())
    }

    pub fn get_current_density(&self) -> f64 {
        self.illumination.gun.current_density
    }

    fn aperture_location(&self, slot: ApertureSlot) -> (&OpticalChain, ApertureId) {
        match slot {
            ApertureSlot::Condenser => (&self.illumination.chain, self.condenser_aperture),
            ApertureSlot::Objective => (&self.post_sample, self.objective_aperture),
            ApertureSlot::SelectedArea => (&self.post_sample, self.selected_area_aperture),
        }
    }

    fn aperture_mut(&mut self, slot: ApertureSlot) -> &mut Aperture {
        match slot {
            ApertureSlot::Condenser => &mut self.illumination.chain[self.condenser_aperture],
            ApertureSlot::Objective => &mut self.post_sample[self.objective_aperture],
            ApertureSlot::SelectedArea => &mut self.post_sample[self.selected_area_aperture],
        }
    }

    pub fn aperture(&self, slot: ApertureSlot) -> &Aperture {
        let (chain, id) = self.aperture_location(slot);
        &chain[id]
    }

    /// Select bore `index` of the aperture strip in `slot`
    pub fn select_aperture(
        &mut self,
        slot: ApertureSlot,
        index: usize,
    ) -> Result<(), SimulationError> {
        self.aperture_mut(slot).select(index)
    }

    pub fn insert_aperture(&mut self, slot: ApertureSlot) {
        self.aperture_mut(slot).insert();
    }

    pub fn retract_aperture(&mut self, slot: ApertureSlot) {
        self.aperture_mut(slot).retract();
    }

    fn render(&self, binsize: usize) -> CameraResult<Array2<f64>> {
        let shape = self.config.camera.binned_shape(binsize)?;
        let (x_min, x_max, y_min, y_max) = self.beam_on_stage().external_extent();

        let frame = if self.mode.is_diffraction() {
            self.stage
                .get_diffraction_pattern(shape, x_min, x_max, y_min, y_max)
        } else {
            self.stage.get_image(shape, x_min, x_max, y_min, y_max)
        };
        Ok(frame)
    }
}

impl CameraInterface for TemSimulation {
    fn establish_connection(&mut self) -> CameraResult<()> {
        Ok(())
    }

    fn release_connection(&mut self) -> CameraResult<()> {
        Ok(())
    }

    fn get_config(&self) -> &CameraConfig {
        &self.config.camera
    }

    fn is_streamable(&self) -> bool {
        true
    }

    /// Render the current instrument state
    ///
    /// Diffraction mode yields a diffraction pattern, every other mode a
    /// bright-field image. The exposure does not affect the simulated frame.
    fn get_image(
        &mut self,
        exposure: Option<Duration>,
        binsize: Option<usize>,
    ) -> CameraResult<Array2<f64>> {
        let exposure = exposure.unwrap_or(self.config.camera.default_exposure);
        let binsize = binsize.unwrap_or(self.config.camera.default_binsize);
        debug!(
            "Acquiring in {} mode, exposure {:?}, binsize {}",
            self.mode, exposure, binsize
        );
        self.render(binsize)
    }
}

impl MicroscopeInterface for TemSimulation {
    fn establish_connection(&mut self) -> MicroscopeResult<()> {
        Ok(())
    }

    fn release_connection(&mut self) -> MicroscopeResult<()> {
        Ok(())
    }

    fn get_beam_shift(&self) -> (f64, f64) {
        self.illumination.chain[self.beam_shift_deflector].position()
    }

    fn set_beam_shift(&mut self, x: f64, y: f64) -> MicroscopeResult<()> {
        self.illumination.chain[self.beam_shift_deflector].set_position(x, y);
        Ok(())
    }

    fn get_beam_tilt(&self) -> (f64, f64) {
        self.beam_tilt
    }

    fn set_beam_tilt(&mut self, x: f64, y: f64) -> MicroscopeResult<()> {
        self.beam_tilt = (x, y);
        Ok(())
    }

    fn get_gun_shift(&self) -> (f64, f64) {
        self.illumination.chain[self.gun_shift_deflector].position()
    }

    fn set_gun_shift(&mut self, x: f64, y: f64) -> MicroscopeResult<()> {
        self.illumination.chain[self.gun_shift_deflector].set_position(x, y);
        Ok(())
    }

    fn get_gun_tilt(&self) -> (f64, f64) {
        self.gun_tilt
    }

    fn set_gun_tilt(&mut self, x: f64, y: f64) -> MicroscopeResult<()> {
        self.gun_tilt = (x, y);
        Ok(())
    }

    fn get_brightness(&self) -> f64 {
        self.illumination.gun.brightness
    }

    fn get_condenser_lens_stigmator(&self) -> (f64, f64) {
        self.illumination.chain[self.condenser_lens_1].astigmatism()
    }

    fn set_condenser_lens_stigmator(&mut self, x: f64, y: f64) -> MicroscopeResult<()> {
        self.illumination.chain[self.condenser_lens_1].set_astigmatism(x, y);
        Ok(())
    }

    fn get_objective_lens_stigmator(&self) -> (f64, f64) {
        self.post_sample[self.objective_lens].astigmatism()
    }

    fn set_objective_lens_stigmator(&mut self, x: f64, y: f64) -> MicroscopeResult<()> {
        self.post_sample[self.objective_lens].set_astigmatism(x, y);
        Ok(())
    }

    fn get_intermediate_lens_stigmator(&self) -> (f64, f64) {
        self.post_sample[self.intermediate_lens].astigmatism()
    }

    fn set_intermediate_lens_stigmator(&mut self, x: f64, y: f64) -> MicroscopeResult<()> {
        self.post_sample[self.intermediate_lens].set_astigmatism(x, y);
        Ok(())
    }

    fn get_diff_focus(&self, confirm_mode: bool) -> MicroscopeResult<f64> {
        if confirm_mode && !self.mode.is_diffraction() {
            return Err(MicroscopeError::InvalidMode(
                "TEM must be in diffraction mode to read diffraction focus".to_string(),
            ));
        }
        Ok(self.post_sample[self.intermediate_lens].focus)
    }

    fn set_diff_focus(&mut self, value: f64, confirm_mode: bool) -> MicroscopeResult<()> {
        if confirm_mode && !self.mode.is_diffraction() {
            return Err(MicroscopeError::InvalidMode(
                "TEM must be in diffraction mode to set diffraction focus".to_string(),
            ));
        }
        self.post_sample[self.intermediate_lens].focus = value;
        Ok(())
    }

    fn get_diff_shift(&self) -> (f64, f64) {
        self.post_sample[self.image_shift_deflector].position()
    }

    fn set_diff_shift(&mut self, x: f64, y: f64) -> MicroscopeResult<()> {
        self.post_sample[self.image_shift_deflector].set_position(x, y);
        Ok(())
    }

    fn get_function_mode(&self) -> FunctionMode {
        self.mode
    }

    fn set_function_mode(&mut self, mode: &str) -> MicroscopeResult<()> {
        self.mode = mode.parse()?;
        Ok(())
    }

    fn get_image_shift1(&self) -> (f64, f64) {
        self.post_sample[self.image_shift_deflector].position()
    }

    fn set_image_shift1(&mut self, x: f64, y: f64) -> MicroscopeResult<()> {
        self.post_sample[self.image_shift_deflector].set_position(x, y);
        Ok(())
    }

    fn get_image_shift2(&self) -> (f64, f64) {
        self.image_shift2
    }

    fn set_image_shift2(&mut self, x: f64, y: f64) -> MicroscopeResult<()> {
        self.image_shift2 = (x, y);
        Ok(())
    }

    fn get_magnification(&self) -> f64 {
        self.post_sample[self.objective_lens].magnification()
    }

    fn get_magnification_index(&self) -> usize {
        0
    }

    fn get_ht_value(&self) -> f64 {
        self.illumination.gun.acceleration_voltage
    }

    fn get_screen_position(&self) -> ScreenPosition {
        self.screen_position
    }

    fn set_screen_position(&mut self, value: ScreenPosition) -> MicroscopeResult<()> {
        self.screen_position = value;
        Ok(())
    }

    /// Beam size on the specimen, taken as the sum of the semi-axes
    fn get_spot_size(&self) -> f64 {
        let beam = self.beam_on_stage();
        beam.a() + beam.b()
    }

    fn get_stage_position(&self) -> StagePosition {
        self.stage.position()
    }

    fn set_stage_position(
        &mut self,
        update: StagePositionUpdate,
        _wait: bool,
    ) -> MicroscopeResult<()> {
        self.stage.set_position(update);
        Ok(())
    }

    fn is_stage_moving(&self) -> bool {
        false
    }

    fn stop_stage(&mut self) -> MicroscopeResult<()> {
        Ok(())
    }

    fn is_beam_blanked(&self) -> bool {
        self.beam_blanked
    }

    fn set_beam_blank(&mut self, blanked: bool) -> MicroscopeResult<()> {
        self.beam_blanked = blanked;
        Ok(())
    }
}
