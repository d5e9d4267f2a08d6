// SPDX-License-Identifier: GPL-3.0-only

//! Wizard state, messages and events

use crate::backends::camera::CapturedFrame;
use crate::backends::separation::{CutoutImage, SeparationResult};
use crate::constants::labels;
use crate::media::ObjectUrl;
use uuid::Uuid;

/// Stage of the wizard; exactly one is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Capture,
    RemoveBackground,
}

impl Step {
    pub fn title(&self) -> &'static str {
        match self {
            Step::Capture => labels::CAPTURE_TITLE,
            Step::RemoveBackground => labels::SEPARATION_TITLE,
        }
    }

    pub fn tip(&self) -> &'static str {
        match self {
            Step::Capture => labels::CAPTURE_TIP,
            Step::RemoveBackground => labels::SEPARATION_TIP,
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Capture => write!(f, "capture"),
            Step::RemoveBackground => write!(f, "remove-background"),
        }
    }
}

/// Top-level message, routed to the controller of the matching step
#[derive(Debug)]
pub enum Message {
    Capture(CaptureMessage),
    Separation(SeparationMessage),
}

#[derive(Debug, Clone)]
pub enum CaptureMessage {
    /// Capture button pressed
    TriggerCapture,
    /// Countdown period elapsed for the given run
    Tick { run: Uuid },
    /// Discard the frame (and any countdown) and go back to the live feed
    Retake,
    /// "Looks Good"
    Confirm,
}

#[derive(Debug)]
pub enum SeparationMessage {
    RemoveBackground,
    /// The separation operation for `attempt` settled
    Finished {
        attempt: Uuid,
        result: SeparationResult<CutoutImage>,
    },
    /// "Continue"
    Confirm,
    Back,
}

/// Completion events a controller hands up to the orchestrator
#[derive(Debug, Clone)]
pub enum StepEvent {
    CaptureConfirmed(CapturedFrame),
    SeparationConfirmed(CutoutImage),
    BackRequested,
}

/// A rendered control; absence (`None` at the call site) means not rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Control {
    pub label: &'static str,
    pub enabled: bool,
}

impl Control {
    pub fn enabled(label: &'static str) -> Self {
        Self {
            label,
            enabled: true,
        }
    }

    pub fn disabled(label: &'static str) -> Self {
        Self {
            label,
            enabled: false,
        }
    }
}

/// Capture controller state as seen from outside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Live preview, no countdown
    Live,
    /// Live preview with the countdown showing `remaining`
    Counting(u32),
    /// Frame shown instead of the preview
    FramePresent,
}

/// Controls of the capture step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureControls {
    pub capture: Option<Control>,
    pub retake: Option<Control>,
    pub confirm: Option<Control>,
}

/// Separation controller state
///
/// A result and an error can never coexist.
#[derive(Debug, Default)]
pub enum SeparationState {
    #[default]
    Idle,
    /// One operation in flight
    Processing { attempt: Uuid },
    /// Cutout available, shown through `url`
    Ready { cutout: CutoutImage, url: ObjectUrl },
    /// Last attempt failed; `message` is the user-facing text
    Failed { message: &'static str },
}

impl SeparationState {
    pub fn is_processing(&self) -> bool {
        matches!(self, SeparationState::Processing { .. })
    }

    pub fn cutout(&self) -> Option<&CutoutImage> {
        match self {
            SeparationState::Ready { cutout, .. } => Some(cutout),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&'static str> {
        match self {
            SeparationState::Failed { message } => Some(message),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SeparationState::Idle => "idle",
            SeparationState::Processing { .. } => "processing",
            SeparationState::Ready { .. } => "ready",
            SeparationState::Failed { .. } => "failed",
        }
    }
}

/// Controls of the separation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeparationControls {
    pub back: Control,
    pub remove_background: Option<Control>,
    pub confirm: Option<Control>,
}

/// Artifacts produced by completed steps
#[derive(Debug, Clone, Default)]
pub struct Artifacts {
    pub frame: Option<CapturedFrame>,
    pub cutout: Option<CutoutImage>,
}
