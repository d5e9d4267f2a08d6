// SPDX-License-Identifier: MPL-2.0

//! Photo booth - a guided capture wizard
//!
//! Takes a photo from a camera after a short countdown, removes its
//! background, and hands both images on to whatever comes next.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Wizard orchestrator, step controllers and the event loop
//! - [`backends`]: Camera and background separation abstraction
//! - [`media`]: Image encoding and scoped display URLs
//! - [`config`]: User configuration handling
//! - [`storage`]: Saving finished sessions
//! - [`terminal`]: Interactive terminal front end
//!
//! # Example
//!
//! ```ignore
//! let camera = Arc::new(StillImageCamera::from_path("me.jpg"));
//! let separator = Arc::new(BorderKeySeparator::default());
//! let wizard = Wizard::new(Config::default(), camera, separator)?;
//! let mut runtime = WizardRuntime::from_current(wizard)?;
//! runtime.dispatch(Message::Capture(CaptureMessage::TriggerCapture))?;
//! runtime.run_until_idle().await?;
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod media;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use app::{CaptureMessage, Message, SeparationMessage, Step, StepEvent, Wizard, WizardRuntime};
pub use config::Config;
pub use constants::PhotoFormat;
pub use errors::{AppError, AppResult};
