// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Running the whole wizard headless
//! - Printing the configuration
//! - Starting the terminal wizard

use photo_booth::app::{CaptureMessage, Message, SeparationMessage, Step, Wizard, WizardRuntime};
use photo_booth::backends::camera::{CameraBackend, StillImageCamera};
use photo_booth::backends::separation::BorderKeySeparator;
use photo_booth::config::Config;
use photo_booth::errors::{AppError, CameraError};
use photo_booth::storage;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Overrides for a single headless run
pub struct CaptureArgs {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub countdown: Option<u32>,
    pub tolerance: Option<f32>,
    pub open: bool,
}

/// Start the interactive terminal wizard
pub fn run_terminal(
    config: Config,
    input: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(input) = input else {
        eprintln!("No camera feed given; pass --input <image>");
        return Err(AppError::Camera(CameraError::NoCameraFound).into());
    };
    photo_booth::terminal::run(config, input)
}

/// Run capture, background removal and save without any UI
pub fn capture(mut config: Config, args: CaptureArgs) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(countdown) = args.countdown {
        config.countdown_seconds = countdown;
    }
    if let Some(tolerance) = args.tolerance {
        config.separation.tolerance = tolerance;
    }
    if let Some(output) = args.output {
        config.output_dir = Some(output);
    }
    config.validate()?;

    let camera = Arc::new(StillImageCamera::from_path(&args.input));
    println!("Using camera: {}", camera.name());
    let separator = Arc::new(BorderKeySeparator::new(config.separation));
    let output_dir = config.output_directory();

    let rt = tokio::runtime::Runtime::new()?;
    let saved = rt.block_on(async {
        let wizard = Wizard::new(config, camera, separator)?;
        let mut runtime = WizardRuntime::from_current(wizard)?;

        runtime.dispatch(Message::Capture(CaptureMessage::TriggerCapture))?;
        loop {
            if let Some(remaining) = runtime
                .wizard()
                .capture()
                .and_then(|capture| capture.countdown_display())
            {
                println!("{}...", remaining);
            }
            if !runtime.step().await? {
                break;
            }
        }

        runtime.dispatch(Message::Capture(CaptureMessage::Confirm))?;
        if runtime.wizard().step() != Step::RemoveBackground {
            return Err(AppError::Other("No frame was captured".into()));
        }
        println!("Captured. Removing background...");

        runtime.dispatch(Message::Separation(SeparationMessage::RemoveBackground))?;
        runtime.run_until_idle().await?;
        if let Some(message) = runtime
            .wizard()
            .separation()
            .and_then(|separation| separation.error())
        {
            return Err(AppError::Other(message.to_string()));
        }
        runtime.dispatch(Message::Separation(SeparationMessage::Confirm))?;

        let wizard = runtime.into_wizard();
        let frame = wizard
            .frame()
            .ok_or_else(|| AppError::Other("No frame was captured".into()))?;
        storage::save_session(frame, wizard.cutout(), &output_dir).await
    })?;

    println!("Photo saved: {}", saved.photo.display());
    if let Some(cutout) = &saved.cutout {
        println!("Cutout saved: {}", cutout.display());
        if args.open {
            open::that(cutout)?;
        }
    }
    Ok(())
}

/// Print the effective configuration, optionally writing it back
pub fn show_config(
    config: &Config,
    path: Option<&Path>,
    save: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = path.map(Path::to_path_buf).or_else(Config::default_path);
    match &path {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: (no config directory on this platform)"),
    }
    println!("Output directory: {}", config.output_directory().display());
    println!();
    println!("{}", serde_json::to_string_pretty(config)?);

    if save {
        let path = path.ok_or("No config directory on this platform")?;
        config.save_to(&path)?;
        println!();
        println!("Saved: {}", path.display());
    }
    Ok(())
}
