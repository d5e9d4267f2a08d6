// SPDX-License-Identifier: MPL-2.0

//! Guided capture wizard
//!
//! This module contains the wizard state, message handling and the two step
//! controllers.
//!
//! # Architecture
//!
//! - `state`: Step, messages, events and control view-models
//! - `task`: Deferred work returned from `update`
//! - `capture`: Camera capture step and its countdown
//! - `separation`: Background separation step
//! - `update`: Message routing and step transitions
//! - `runtime`: Drives tasks on a tokio runtime
//!
//! # Main Types
//!
//! - `Wizard`: Flow orchestrator owning the active step and the artifacts
//! - `Message`: Input to [`Wizard::update`]
//! - `StepEvent`: Completion events handed up by the controllers

pub mod capture;
pub mod runtime;
pub mod separation;
mod state;
pub mod task;
mod update;

pub use capture::CaptureController;
pub use runtime::WizardRuntime;
pub use separation::SeparationController;
pub use state::{
    Artifacts, CaptureControls, CaptureMessage, CaptureMode, Control, Message,
    SeparationControls, SeparationMessage, SeparationState, Step, StepEvent,
};
pub use task::{Action, Task};

use crate::backends::camera::{CameraBackend, CapturedFrame};
use crate::backends::separation::{BackgroundSeparator, CutoutImage};
use crate::config::Config;
use crate::errors::AppResult;
use crate::media::ObjectUrlStore;
use std::sync::Arc;
use tracing::info;

/// The mounted controller; exactly one at a time
enum Stage {
    Capture(CaptureController),
    RemoveBackground(SeparationController),
}

/// Flow orchestrator
///
/// Holds the current step and everything completed steps produced. Each
/// controller lives exactly as long as its step is active.
pub struct Wizard {
    config: Config,
    camera: Arc<dyn CameraBackend>,
    separator: Arc<dyn BackgroundSeparator>,
    urls: ObjectUrlStore,
    stage: Stage,
    artifacts: Artifacts,
}

impl Wizard {
    /// Open the camera and mount the capture step
    pub fn new(
        config: Config,
        camera: Arc<dyn CameraBackend>,
        separator: Arc<dyn BackgroundSeparator>,
    ) -> AppResult<Self> {
        info!(
            camera = camera.name(),
            separator = separator.name(),
            countdown = config.countdown_seconds,
            "Starting photo booth wizard"
        );
        let stream = camera.open()?;
        let stage = Stage::Capture(CaptureController::new(stream, &config));
        Ok(Self {
            config,
            camera,
            separator,
            urls: ObjectUrlStore::new(),
            stage,
            artifacts: Artifacts::default(),
        })
    }

    pub fn step(&self) -> Step {
        match self.stage {
            Stage::Capture(_) => Step::Capture,
            Stage::RemoveBackground(_) => Step::RemoveBackground,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn capture(&self) -> Option<&CaptureController> {
        match &self.stage {
            Stage::Capture(controller) => Some(controller),
            Stage::RemoveBackground(_) => None,
        }
    }

    /// Mutable access for pulling preview images off the stream
    pub fn capture_mut(&mut self) -> Option<&mut CaptureController> {
        match &mut self.stage {
            Stage::Capture(controller) => Some(controller),
            Stage::RemoveBackground(_) => None,
        }
    }

    pub fn separation(&self) -> Option<&SeparationController> {
        match &self.stage {
            Stage::RemoveBackground(controller) => Some(controller),
            Stage::Capture(_) => None,
        }
    }

    pub fn artifacts(&self) -> &Artifacts {
        &self.artifacts
    }

    /// Frame handed over by the capture step
    pub fn frame(&self) -> Option<&CapturedFrame> {
        self.artifacts.frame.as_ref()
    }

    /// Cutout handed over by the separation step
    pub fn cutout(&self) -> Option<&CutoutImage> {
        self.artifacts.cutout.as_ref()
    }

    /// Whether the last implemented step has been confirmed
    pub fn finished(&self) -> bool {
        self.artifacts.cutout.is_some()
    }

    /// Store backing the display URLs handed out by the controllers
    pub fn urls(&self) -> &ObjectUrlStore {
        &self.urls
    }
}
