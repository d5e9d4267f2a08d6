// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use serde::{Deserialize, Serialize};

/// Encoding used for captured frames
///
/// Cutouts are always PNG since they carry transparency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PhotoFormat {
    /// JPEG, the format browsers hand back from a webcam screenshot
    #[default]
    Jpeg,
    /// Lossless PNG
    Png,
}

impl PhotoFormat {
    /// Get all variants for UI iteration
    pub const ALL: [PhotoFormat; 2] = [PhotoFormat::Jpeg, PhotoFormat::Png];

    /// Get display name for the format
    pub fn display_name(&self) -> &'static str {
        match self {
            PhotoFormat::Jpeg => "JPEG",
            PhotoFormat::Png => "PNG",
        }
    }

    /// MIME type used in data URIs and object URLs
    pub fn mime_type(&self) -> &'static str {
        match self {
            PhotoFormat::Jpeg => "image/jpeg",
            PhotoFormat::Png => "image/png",
        }
    }

    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            PhotoFormat::Jpeg => "jpg",
            PhotoFormat::Png => "png",
        }
    }
}

/// Capture countdown constants
pub mod countdown {
    use std::time::Duration;

    /// Value the countdown starts from
    pub const DEFAULT_START: u32 = 2;

    /// Period between ticks
    pub const TICK_INTERVAL: Duration = Duration::from_millis(1000);
}

/// Background separation constants
pub mod separation {
    /// The only failure text ever shown to the user
    pub const GENERIC_ERROR: &str = "Something went wrong. Please try again.";

    /// Maximum RGB distance from the background colour that is fully removed
    pub const DEFAULT_TOLERANCE: f32 = 48.0;

    /// Distance band over which alpha ramps from 0 to 255
    pub const DEFAULT_FEATHER: f32 = 24.0;

    /// Border band (pixels) sampled to estimate the background colour
    pub const DEFAULT_BORDER_WIDTH: u32 = 8;

    /// MIME type of every cutout
    pub const CUTOUT_MIME: &str = "image/png";
}

/// Step titles and control labels
pub mod labels {
    pub const CAPTURE_TITLE: &str = "Step 1: Take Your Photo";
    pub const CAPTURE_TIP: &str = "Tip: face a window • plain background";
    pub const SEPARATION_TITLE: &str = "Step 2: Remove Background";
    pub const SEPARATION_TIP: &str = "Best results: plain background • good lighting";

    pub const CAPTURE: &str = "Capture";
    pub const RETAKE: &str = "Retake";
    pub const LOOKS_GOOD: &str = "Looks Good";
    pub const REMOVE_BACKGROUND: &str = "Remove Background";
    pub const PROCESSING: &str = "Processing…";
    pub const CONTINUE: &str = "Continue";
    pub const BACK: &str = "Back";

    pub const CUTOUT_PLACEHOLDER: &str = "Your cutout will appear here after processing.";
    pub const CUTOUT_PROCESSING: &str = "Removing background…";
    pub const CUTOUT_READY: &str = "Background removed!";
}

/// Supported still image inputs
pub mod file_formats {
    /// Supported image file extensions
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

/// Application information utilities
pub mod app_info {
    /// Directory name used under the config and pictures directories
    pub const APP_DIR_NAME: &str = "photo-booth";

    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_format_mime_matches_extension() {
        assert_eq!(PhotoFormat::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(PhotoFormat::Png.extension(), "png");
        assert_eq!(PhotoFormat::default(), PhotoFormat::Jpeg);
    }

    #[test]
    fn test_image_extensions() {
        assert!(file_formats::is_image_extension("JPG"));
        assert!(file_formats::is_image_extension("png"));
        assert!(!file_formats::is_image_extension("mp4"));
    }
}
