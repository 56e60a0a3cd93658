//! Render a single frame from the simulated microscope
//!
//! Builds a simulation from defaults, a JSON configuration or a stored camera
//! profile, applies mode, stage and beam settings, and writes the frame as an
//! 8-bit PNG.

use clap::Parser;
use std::fs;
use std::path::PathBuf;
use temsim::io::{normalize_to_u8, save_u8_image};
use temsim::{SimulationConfig, TemSimulation};
use temsim_shared::camera_interface::CameraInterface;
use temsim_shared::config_storage::ConfigStorage;
use temsim_shared::microscope_interface::{MicroscopeInterface, StagePositionUpdate};

/// Command line arguments for the frame renderer
#[derive(Parser, Debug)]
#[command(version, about = "Simulated TEM frame renderer")]
struct Args {
    /// JSON file holding a full simulation configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Name of a camera profile in the configuration store
    #[arg(long)]
    camera: Option<String>,

    /// Seed of the sample population
    #[arg(long)]
    seed: Option<u64>,

    /// Number of crystals on the grid
    #[arg(long = "num-crystals")]
    num_crystals: Option<usize>,

    /// Function mode (mag1, mag2, lowmag, samag, diff)
    #[arg(long, default_value = "mag1")]
    mode: String,

    /// Binning factor, the camera default when omitted
    #[arg(long)]
    binsize: Option<usize>,

    /// Stage alpha tilt in degrees
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    alpha: f64,

    /// Stage beta tilt in degrees
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    beta: f64,

    /// Beam shift along x in nm
    #[arg(long = "beam-x", default_value_t = 0.0, allow_hyphen_values = true)]
    beam_x: f64,

    /// Beam shift along y in nm
    #[arg(long = "beam-y", default_value_t = 0.0, allow_hyphen_values = true)]
    beam_y: f64,

    /// Output PNG path
    #[arg(short, long, default_value = "tem_frame.png")]
    output: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut config: SimulationConfig = match &args.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => SimulationConfig::default(),
    };
    if let Some(name) = &args.camera {
        config.camera = ConfigStorage::new()?
            .get_camera_config(name)
            .ok_or_else(|| format!("No stored camera configuration named '{name}'"))??;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(num_crystals) = args.num_crystals {
        config.stage.num_crystals = num_crystals;
    }

    let mut tem = TemSimulation::new(config)?;
    tem.set_function_mode(&args.mode)?;
    tem.set_stage_position(
        StagePositionUpdate {
            alpha_tilt: Some(args.alpha),
            beta_tilt: Some(args.beta),
            ..Default::default()
        },
        true,
    )?;
    tem.set_beam_shift(args.beam_x, args.beam_y)?;

    let frame = tem.get_image(None, args.binsize)?;
    let (rows, cols) = frame.dim();
    let lit = frame.iter().filter(|&&value| value != 0.0).count();

    println!("Camera: {}", tem.name());
    println!("Mode: {}", tem.get_function_mode());
    println!("Frame: {rows}x{cols}, {lit} non-zero pixels");

    save_u8_image(&normalize_to_u8(&frame), &args.output)?;
    println!("Saved frame to {}", args.output.display());

    Ok(())
}
