// SPDX-License-Identifier: MPL-2.0

//! External collaborators of the wizard
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                Wizard (app)                 │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                  │
//! │  ┌──────────────┐    ┌──────────────────┐   │
//! │  │    Camera    │    │   Separation     │   │
//! │  │ (live feed)  │    │ (subject cutout) │   │
//! │  └──────────────┘    └──────────────────┘   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: Camera streams and the captured frame type
//! - [`separation`]: Background separation operation and cancellation

pub mod camera;
pub mod separation;
