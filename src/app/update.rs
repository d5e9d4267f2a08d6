// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! The `update()` function routes each message to the mounted controller and
//! applies the step transitions for the events the controllers hand back.
//! Messages addressed to a step that is not mounted are dropped; that is how
//! late ticks and separation outcomes from a previous step die.

use super::state::{Message, Step, StepEvent};
use super::task::{Action, Task};
use super::{CaptureController, SeparationController, Stage, Wizard};
use crate::backends::camera::CapturedFrame;
use crate::backends::separation::CutoutImage;
use crate::errors::AppResult;
use tracing::{debug, info};

impl Wizard {
    /// Main message handler
    ///
    /// Only fails when back-navigation cannot re-acquire the camera.
    pub fn update(&mut self, message: Message) -> AppResult<Task<Message>> {
        let step = self.step();
        let action = match (&mut self.stage, message) {
            (Stage::Capture(controller), Message::Capture(message)) => {
                controller.update(message).map(Message::Capture)
            }
            (Stage::RemoveBackground(controller), Message::Separation(message)) => {
                controller.update(message).map(Message::Separation)
            }
            (_, message) => {
                debug!(%step, ?message, "Dropping message for inactive step");
                Action::None
            }
        };

        match action {
            Action::None => Ok(Task::none()),
            Action::Task(task) => Ok(task),
            Action::Event(event) => self.handle_event(event),
        }
    }

    fn handle_event(&mut self, event: StepEvent) -> AppResult<Task<Message>> {
        match event {
            StepEvent::CaptureConfirmed(frame) => self.handle_capture_confirmed(frame),
            StepEvent::BackRequested => self.handle_back_requested()?,
            StepEvent::SeparationConfirmed(cutout) => self.handle_separation_confirmed(cutout),
        }
        Ok(Task::none())
    }

    fn handle_capture_confirmed(&mut self, frame: CapturedFrame) {
        info!(frame = %frame.id, "Advancing to background removal");
        // The separation controller gets its own handle on the same frame
        let controller =
            SeparationController::new(frame.clone(), self.separator.clone(), self.urls.clone());
        self.artifacts.frame = Some(frame);
        self.artifacts.cutout = None;
        // Replacing the stage drops the capture controller and its stream
        self.stage = Stage::RemoveBackground(controller);
    }

    fn handle_back_requested(&mut self) -> AppResult<()> {
        if self.step() != Step::RemoveBackground {
            debug!("Back requested outside the separation step");
            return Ok(());
        }

        // On failure the separation step stays mounted
        let stream = self.camera.open()?;

        let controller = match (&self.artifacts.frame, self.config.keep_frame_on_back) {
            (Some(frame), true) => {
                info!(frame = %frame.id, "Back to capture, keeping frame");
                CaptureController::with_frame(stream, &self.config, frame.clone())
            }
            _ => {
                info!("Back to capture");
                CaptureController::new(stream, &self.config)
            }
        };
        // Dropping the separation controller cancels its work and revokes its URL
        self.stage = Stage::Capture(controller);
        Ok(())
    }

    fn handle_separation_confirmed(&mut self, cutout: CutoutImage) {
        info!(
            cutout = %cutout.id,
            frame = %cutout.source_frame,
            width = cutout.width,
            height = cutout.height,
            "Cutout confirmed, flow complete"
        );
        self.artifacts.cutout = Some(cutout);
    }
}
