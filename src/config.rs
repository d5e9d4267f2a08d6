// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as pretty-printed JSON under the platform config directory
//! (`~/.config/photo-booth/config.json` on Linux). Unknown or missing fields
//! fall back to their defaults so older files keep loading.

use crate::constants::{PhotoFormat, app_info, countdown, separation};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Tuning for the built-in border-key separator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeparationSettings {
    /// Colour distance below which a pixel counts as background
    pub tolerance: f32,
    /// Width of the soft edge past the tolerance
    pub feather: f32,
    /// Border band sampled for the background colour
    pub border_width: u32,
}

impl Default for SeparationSettings {
    fn default() -> Self {
        Self {
            tolerance: separation::DEFAULT_TOLERANCE,
            feather: separation::DEFAULT_FEATHER,
            border_width: separation::DEFAULT_BORDER_WIDTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Countdown start value; 0 captures as soon as the trigger is pressed
    pub countdown_seconds: u32,
    /// Countdown tick period in milliseconds
    pub tick_interval_ms: u64,
    /// Mirror preview and captured frame horizontally (selfie mode)
    pub mirror_preview: bool,
    /// Encoding of captured frames
    pub photo_format: PhotoFormat,
    /// JPEG quality (1-100), ignored for PNG
    pub jpeg_quality: u8,
    /// Re-mount the capture step showing the kept frame after "Back"
    pub keep_frame_on_back: bool,
    /// Border-key separator tuning
    pub separation: SeparationSettings,
    /// Where finished sessions are written (default: ~/Pictures/photo-booth)
    pub output_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            countdown_seconds: countdown::DEFAULT_START,
            tick_interval_ms: countdown::TICK_INTERVAL.as_millis() as u64,
            mirror_preview: true, // Default to mirrored (selfie mode)
            photo_format: PhotoFormat::default(),
            jpeg_quality: 92,
            keep_frame_on_back: false,
            separation: SeparationSettings::default(),
            output_dir: None,
        }
    }
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(app_info::APP_DIR_NAME).join("config.json"))
    }

    /// Load the config from the default location, falling back to defaults
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_or_default(&path),
            None => {
                warn!("No config directory on this platform, using defaults");
                Self::default()
            }
        }
    }

    /// Load from `path`; a missing or unreadable file yields the defaults
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Self::default();
        }
        match Self::load_from(path) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %path.display(), %err, "Invalid config file, using defaults");
                Self::default()
            }
        }
    }

    /// Load from `path`, reporting any failure
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Write to the default location
    pub fn save(&self) -> AppResult<PathBuf> {
        let path = Self::default_path()
            .ok_or_else(|| AppError::Config("no config directory on this platform".into()))?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Write to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Reject values no component can work with
    pub fn validate(&self) -> AppResult<()> {
        if self.tick_interval_ms == 0 {
            return Err(AppError::Config("tick_interval_ms must be positive".into()));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(AppError::Config(format!(
                "jpeg_quality must be within 1-100, got {}",
                self.jpeg_quality
            )));
        }
        let SeparationSettings {
            tolerance, feather, ..
        } = self.separation;
        if !tolerance.is_finite() || !feather.is_finite() || tolerance < 0.0 || feather < 0.0 {
            return Err(AppError::Config(format!(
                "separation tolerance and feather must be finite and not negative, got {} and {}",
                tolerance, feather
            )));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Output directory, defaulting to the user's pictures folder
    pub fn output_directory(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| {
            dirs::picture_dir()
                .or_else(dirs::home_dir)
                .unwrap_or_else(|| PathBuf::from("."))
                .join(app_info::APP_DIR_NAME)
        })
    }
}
