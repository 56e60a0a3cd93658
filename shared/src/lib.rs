//! Shared components for the TEM simulator and the acquisition software.
//!
//! This crate holds the camera and microscope contracts that the simulator
//! implements and that hardware adapters implement alike, plus the storage of
//! named camera configurations.

pub mod camera_interface;
pub mod config_storage;
pub mod microscope_interface;
