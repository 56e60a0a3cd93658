//! Transmission electron microscope and camera simulation
//!
//! This crate models the electron-optical column as a chain of beam
//! transforms, a goniometer stage carrying a random population of crystals
//! on a support grid, and the rendering of the current instrument state into
//! bright-field images or diffraction patterns. [`TemSimulation`] exposes it
//! all through the shared microscope and camera contracts.

pub mod algo;
pub mod error;
pub mod io;
pub mod optics;
pub mod specimen;
pub mod tem;

// Re-exports for easier access
pub use error::SimulationError;
pub use optics::{Beam, Gun, OpticalComponent};
pub use specimen::{Stage, StageConfig};
pub use tem::{ApertureSlot, SimulationConfig, TemSimulation};
