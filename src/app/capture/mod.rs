// SPDX-License-Identifier: GPL-3.0-only

//! Camera capture step
//!
//! Owns the open camera stream, the countdown and the captured frame.
//!
//! ```text
//! Live --TriggerCapture--> Counting --terminal Tick--> FramePresent
//!   ^                         |                            |
//!   +--------- Retake --------+-------------- Retake ------+
//!                                    FramePresent --Confirm--> (orchestrator)
//! ```
//!
//! Preview and frame are mutually exclusive: [`CaptureController::preview`]
//! returns nothing while a frame is present.

pub mod countdown;

pub use countdown::{Countdown, CountdownStart, TickOutcome};

use super::state::{CaptureControls, CaptureMessage, CaptureMode, Control, StepEvent};
use super::task::{Action, Task};
use crate::backends::camera::{CameraStream, CapturedFrame};
use crate::config::Config;
use crate::constants::{PhotoFormat, labels};
use image::RgbaImage;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct CaptureController {
    /// Held for the controller's whole life; dropping it releases the camera
    stream: Box<dyn CameraStream>,
    countdown: Countdown,
    frame: Option<CapturedFrame>,
    tick_interval: Duration,
    mirror: bool,
    format: PhotoFormat,
    jpeg_quality: u8,
}

impl CaptureController {
    pub fn new(stream: Box<dyn CameraStream>, config: &Config) -> Self {
        info!(device = stream.device_name(), "Capture step mounted");
        Self {
            stream,
            countdown: Countdown::new(config.countdown_seconds),
            frame: None,
            tick_interval: config.tick_interval(),
            mirror: config.mirror_preview,
            format: config.photo_format,
            jpeg_quality: config.jpeg_quality,
        }
    }

    /// Mount showing an earlier frame instead of the live feed
    pub fn with_frame(stream: Box<dyn CameraStream>, config: &Config, frame: CapturedFrame) -> Self {
        let mut controller = Self::new(stream, config);
        controller.frame = Some(frame);
        controller
    }

    pub fn mode(&self) -> CaptureMode {
        if self.frame.is_some() {
            CaptureMode::FramePresent
        } else if let Some(remaining) = self.countdown.remaining() {
            CaptureMode::Counting(remaining)
        } else {
            CaptureMode::Live
        }
    }

    pub fn frame(&self) -> Option<&CapturedFrame> {
        self.frame.as_ref()
    }

    /// Countdown value to overlay on the preview
    pub fn countdown_display(&self) -> Option<u32> {
        self.countdown.remaining()
    }

    pub fn device_name(&self) -> &str {
        self.stream.device_name()
    }

    pub fn controls(&self) -> CaptureControls {
        match self.mode() {
            CaptureMode::Live => CaptureControls {
                capture: Some(Control::enabled(labels::CAPTURE)),
                retake: None,
                confirm: None,
            },
            CaptureMode::Counting(_) => CaptureControls {
                capture: Some(Control::disabled(labels::CAPTURE)),
                retake: None,
                confirm: None,
            },
            CaptureMode::FramePresent => CaptureControls {
                capture: None,
                retake: Some(Control::enabled(labels::RETAKE)),
                confirm: Some(Control::enabled(labels::LOOKS_GOOD)),
            },
        }
    }

    /// Current live image, as displayed; `None` while a frame is shown
    pub fn preview(&mut self) -> Option<RgbaImage> {
        if self.frame.is_some() {
            return None;
        }
        match self.stream.current_image() {
            Ok(image) => Some(self.orient(image)),
            Err(err) => {
                debug!(%err, "No preview image");
                None
            }
        }
    }

    fn orient(&self, image: RgbaImage) -> RgbaImage {
        if self.mirror {
            image::imageops::flip_horizontal(&image)
        } else {
            image
        }
    }

    pub fn update(&mut self, message: CaptureMessage) -> Action<CaptureMessage> {
        match message {
            CaptureMessage::TriggerCapture => self.handle_trigger_capture(),
            CaptureMessage::Tick { run } => self.handle_tick(run),
            CaptureMessage::Retake => self.handle_retake(),
            CaptureMessage::Confirm => self.handle_confirm(),
        }
    }

    fn handle_trigger_capture(&mut self) -> Action<CaptureMessage> {
        if self.frame.is_some() {
            debug!("Capture ignored: frame already present");
            return Action::None;
        }
        match self.countdown.start() {
            CountdownStart::AlreadyRunning => Action::None,
            CountdownStart::Immediate => {
                self.grab_frame();
                Action::None
            }
            CountdownStart::Started { run } => Action::Task(Task::delay(
                self.tick_interval,
                CaptureMessage::Tick { run },
            )),
        }
    }

    fn handle_tick(&mut self, run: uuid::Uuid) -> Action<CaptureMessage> {
        match self.countdown.tick(run) {
            TickOutcome::Stale => Action::None,
            TickOutcome::Continue { .. } => Action::Task(Task::delay(
                self.tick_interval,
                CaptureMessage::Tick { run },
            )),
            TickOutcome::Fire => {
                self.grab_frame();
                Action::None
            }
        }
    }

    fn handle_retake(&mut self) -> Action<CaptureMessage> {
        self.countdown.reset();
        if self.frame.take().is_some() {
            info!("Frame discarded, back to live preview");
        }
        Action::None
    }

    fn handle_confirm(&mut self) -> Action<CaptureMessage> {
        match &self.frame {
            Some(frame) => {
                info!(frame = %frame.id, "Frame confirmed");
                Action::Event(StepEvent::CaptureConfirmed(frame.clone()))
            }
            None => {
                debug!("Confirm ignored: no frame");
                Action::None
            }
        }
    }

    /// Grab exactly one still; on failure stay live with nothing captured
    fn grab_frame(&mut self) {
        let image = match self.stream.current_image() {
            Ok(image) => self.orient(image),
            Err(err) => {
                warn!(%err, "Frame grab failed, staying on live preview");
                return;
            }
        };

        match CapturedFrame::encode(&image, self.format, self.jpeg_quality) {
            Ok(frame) => {
                info!(
                    frame = %frame.id,
                    width = frame.width,
                    height = frame.height,
                    bytes = frame.data.len(),
                    "Frame captured"
                );
                self.frame = Some(frame);
            }
            Err(err) => warn!(%err, "Frame encoding failed, staying on live preview"),
        }
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        debug!("Capture step unmounted");
    }
}
