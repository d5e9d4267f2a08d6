// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! ```text
//! ┌─────────────────────┐
//! │  CaptureController  │  ← mounted for the capture step only
//! └──────────┬──────────┘
//!            │ owns
//!            ▼
//! ┌─────────────────────┐
//! │ CameraStream (trait)│  ← live feed, released on drop
//! └──────────┬──────────┘
//!            │ opened by
//!            ▼
//! ┌─────────────────────┐
//! │ CameraBackend trait │  ← held by the wizard for its whole life
//! └─────────────────────┘
//! ```
//!
//! The device is held exactly as long as a [`CameraStream`] exists. The
//! wizard opens one when the capture step is mounted and drops it when the
//! step is left, which is where the media permission is released.

pub mod file_source;
pub mod types;

pub use file_source::StillImageCamera;
pub use types::*;

use image::RgbaImage;

/// Something that can hand out live camera streams
pub trait CameraBackend: Send + Sync {
    /// Human readable backend/device name
    fn name(&self) -> &str;

    /// Acquire the device
    ///
    /// Permission refusal or a missing device is a hard error; the caller
    /// decides what to do with it.
    fn open(&self) -> CameraResult<Box<dyn CameraStream>>;
}

/// An open camera feed
///
/// Dropping the stream releases the device.
pub trait CameraStream: Send {
    fn device_name(&self) -> &str;

    /// The image currently on the feed, unmirrored
    fn current_image(&mut self) -> CameraResult<RgbaImage>;
}
