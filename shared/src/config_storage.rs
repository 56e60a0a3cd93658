//! Configuration storage for camera definitions.
//!
//! Provides centralized storage for named camera configurations.
//! All config is stored in ~/.temsim_config/ by default.

use crate::camera_interface::CameraConfig;
use std::path::{Path, PathBuf};

/// Configuration storage manager for camera definitions.
///
/// Manages loading and saving of camera configuration files from a
/// centralized directory (defaults to ~/.temsim_config/).
#[derive(Debug, Clone)]
pub struct ConfigStorage {
    /// Root directory for all configuration (e.g., ~/.temsim_config)
    root_path: PathBuf,
}

impl ConfigStorage {
    /// Create a new config storage with default path (~/.temsim_config)
    pub fn new() -> std::io::Result<Self> {
        let home = std::env::var("HOME")
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::NotFound, "HOME not set"))?;
        let root_path = PathBuf::from(home).join(".temsim_config");
        Ok(Self { root_path })
    }

    /// Create a new config storage with custom root path
    pub fn with_path(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Get the root configuration path
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    fn cameras_dir(&self) -> PathBuf {
        self.root_path.join("cameras")
    }

    fn camera_filename(&self, name: &str) -> PathBuf {
        let name_safe = name.replace(' ', "_");
        self.cameras_dir().join(format!("{name_safe}.json"))
    }

    /// Get the configuration stored under `name`.
    ///
    /// Returns None if no configuration exists for this camera.
    /// Returns Some(Err) if the file exists but cannot be loaded.
    pub fn get_camera_config(&self, name: &str) -> Option<Result<CameraConfig, std::io::Error>> {
        let path = self.camera_filename(name);

        if !path.exists() {
            return None;
        }

        Some(load_camera_config(&path))
    }

    /// Save a camera configuration under its own name.
    ///
    /// Creates the cameras directory if it doesn't exist.
    /// Returns the path where the configuration was saved.
    pub fn save_camera_config(&self, config: &CameraConfig) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(self.cameras_dir())?;

        let path = self.camera_filename(&config.name);
        let json = serde_json::to_string_pretty(config)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&path, json)?;
        log::debug!("Saved camera config '{}' to {}", config.name, path.display());
        Ok(path)
    }

    /// List the names of all stored camera configurations, sorted.
    pub fn list_camera_configs(&self) -> std::io::Result<Vec<String>> {
        let dir = self.cameras_dir();

        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();

            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.replace('_', " "));
                }
            }
        }

        names.sort();
        Ok(names)
    }

    /// Delete the configuration stored under `name`.
    ///
    /// Returns Ok(true) if the file was deleted, Ok(false) if it didn't exist.
    pub fn delete_camera_config(&self, name: &str) -> std::io::Result<bool> {
        let path = self.camera_filename(name);

        if !path.exists() {
            return Ok(false);
        }

        std::fs::remove_file(path)?;
        Ok(true)
    }
}

impl Default for ConfigStorage {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self::with_path(PathBuf::from(".temsim_config")))
    }
}

/// Load a camera configuration from a JSON file
pub fn load_camera_config(path: &Path) -> Result<CameraConfig, std::io::Error> {
    let json = std::fs::read_to_string(path)?;
    serde_json::from_str(&json).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}
