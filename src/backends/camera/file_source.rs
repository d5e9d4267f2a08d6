// SPDX-License-Identifier: GPL-3.0-only

//! Still image camera
//!
//! Serves a single image as the "live" feed. Used by the command line and the
//! terminal wizard, and anywhere a real device is not wanted.

use super::{CameraBackend, CameraResult, CameraStream};
use crate::constants::file_formats;
use crate::errors::CameraError;
use crate::media::encoding;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

enum Source {
    File(PathBuf),
    Memory(Arc<RgbaImage>),
}

/// Camera backend backed by an image file or an in-memory image
pub struct StillImageCamera {
    name: String,
    source: Source,
}

impl StillImageCamera {
    /// Use the image at `path`; the file is read each time the camera opens
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            source: Source::File(path),
        }
    }

    pub fn from_image(name: impl Into<String>, image: RgbaImage) -> Self {
        Self {
            name: name.into(),
            source: Source::Memory(Arc::new(image)),
        }
    }
}

/// Read and decode an image file, mapping failures to camera errors
fn load_image(path: &Path) -> CameraResult<RgbaImage> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if !file_formats::is_image_extension(&extension) {
        return Err(CameraError::InitializationFailed(format!(
            "Unsupported file format: {}",
            extension
        )));
    }

    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CameraError::NoCameraFound,
        std::io::ErrorKind::PermissionDenied => {
            CameraError::PermissionDenied(path.display().to_string())
        }
        _ => CameraError::InitializationFailed(e.to_string()),
    })?;

    encoding::decode_rgba(&bytes).map_err(|e| CameraError::InitializationFailed(e.to_string()))
}

impl CameraBackend for StillImageCamera {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> CameraResult<Box<dyn CameraStream>> {
        let image = match &self.source {
            Source::File(path) => Arc::new(load_image(path)?),
            Source::Memory(image) => image.clone(),
        };
        info!(
            device = %self.name,
            width = image.width(),
            height = image.height(),
            "Camera opened"
        );
        Ok(Box::new(StillImageStream {
            name: self.name.clone(),
            image,
        }))
    }
}

struct StillImageStream {
    name: String,
    image: Arc<RgbaImage>,
}

impl CameraStream for StillImageStream {
    fn device_name(&self) -> &str {
        &self.name
    }

    fn current_image(&mut self) -> CameraResult<RgbaImage> {
        Ok(self.image.as_ref().clone())
    }
}

impl Drop for StillImageStream {
    fn drop(&mut self) {
        debug!(device = %self.name, "Camera released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_hard_error() {
        let camera = StillImageCamera::from_path("/nonexistent/booth.png");
        assert!(matches!(camera.open(), Err(CameraError::NoCameraFound)));
    }

    #[test]
    fn test_unsupported_extension() {
        let camera = StillImageCamera::from_path("clip.mp4");
        assert!(matches!(
            camera.open(),
            Err(CameraError::InitializationFailed(_))
        ));
    }

    #[test]
    fn test_memory_source_serves_image() {
        let image = RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 255]));
        let camera = StillImageCamera::from_image("test", image.clone());
        let mut stream = camera.open().unwrap();
        assert_eq!(stream.device_name(), "test");
        assert_eq!(stream.current_image().unwrap(), image);
    }

    #[test]
    fn test_file_source_reads_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        RgbaImage::from_pixel(5, 5, image::Rgba([9, 9, 9, 255]))
            .save(&path)
            .unwrap();

        let camera = StillImageCamera::from_path(&path);
        assert_eq!(camera.name(), "frame.png");
        let mut stream = camera.open().unwrap();
        assert_eq!(stream.current_image().unwrap().dimensions(), (5, 5));
    }
}
