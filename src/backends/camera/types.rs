// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for camera backends

use crate::constants::PhotoFormat;
use crate::errors::{CameraError, PhotoError};
use crate::media::encoding;
use chrono::{DateTime, Local};
use image::RgbaImage;
use std::sync::Arc;
use uuid::Uuid;

pub type CameraResult<T> = Result<T, CameraError>;

/// A still grabbed from the live feed, held encoded
///
/// Cloning is cheap: the encoded bytes are shared. Every grab gets a fresh
/// `id`, so two clones of the same capture compare equal with
/// [`CapturedFrame::same_frame`] while two separate captures never do.
#[derive(Clone)]
pub struct CapturedFrame {
    pub id: Uuid,
    pub data: Arc<[u8]>,
    pub format: PhotoFormat,
    pub width: u32,
    pub height: u32,
    pub captured_at: DateTime<Local>,
}

impl CapturedFrame {
    /// Encode a raw RGBA still into a new frame
    pub fn encode(
        image: &RgbaImage,
        format: PhotoFormat,
        jpeg_quality: u8,
    ) -> Result<Self, PhotoError> {
        let data = encoding::encode_rgba(image, format, jpeg_quality)?;
        Ok(Self {
            id: Uuid::new_v4(),
            data: Arc::from(data),
            format,
            width: image.width(),
            height: image.height(),
            captured_at: Local::now(),
        })
    }

    /// Accept a frame that arrived as a `data:` URI
    pub fn from_data_uri(uri: &str) -> Result<Self, PhotoError> {
        let (mime, bytes) = encoding::parse_data_uri(uri)?;
        let format = PhotoFormat::ALL
            .into_iter()
            .find(|f| f.mime_type() == mime)
            .ok_or_else(|| PhotoError::DecodingFailed(format!("unsupported MIME type {}", mime)))?;
        let (width, height) = encoding::decode_rgba(&bytes)?.dimensions();
        Ok(Self {
            id: Uuid::new_v4(),
            data: Arc::from(bytes),
            format,
            width,
            height,
            captured_at: Local::now(),
        })
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn to_data_uri(&self) -> String {
        encoding::to_data_uri(self.mime_type(), &self.data)
    }

    /// Decode back to RGBA pixels
    pub fn decode(&self) -> Result<RgbaImage, PhotoError> {
        encoding::decode_rgba(&self.data)
    }

    /// True when both values come from the same capture
    pub fn same_frame(&self, other: &CapturedFrame) -> bool {
        self.id == other.id
    }
}

impl std::fmt::Debug for CapturedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturedFrame")
            .field("id", &self.id)
            .field("format", &self.format)
            .field("size", &format_args!("{}x{}", self.width, self.height))
            .field("bytes", &self.data.len())
            .finish()
    }
}
