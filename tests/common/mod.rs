// SPDX-License-Identifier: MPL-2.0

//! Shared mocks for the integration tests

#![allow(dead_code)]

use futures::FutureExt;
use futures::future::BoxFuture;
use image::{Rgba, RgbaImage};
use photo_booth::Config;
use photo_booth::backends::camera::{CameraBackend, CameraResult, CameraStream, CapturedFrame};
use photo_booth::backends::separation::{
    BackgroundSeparator, CancelSignal, CutoutImage, SeparationResult,
};
use photo_booth::constants::PhotoFormat;
use photo_booth::errors::{CameraError, SeparationError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use uuid::Uuid;

/// Green backdrop with a red subject in the middle
pub fn test_image() -> RgbaImage {
    RgbaImage::from_fn(24, 16, |x, y| {
        if (8..16).contains(&x) && (4..12).contains(&y) {
            Rgba([220, 30, 30, 255])
        } else {
            Rgba([20, 200, 40, 255])
        }
    })
}

/// Defaults with lossless frames so pixel checks are exact
pub fn test_config() -> Config {
    Config {
        photo_format: PhotoFormat::Png,
        ..Config::default()
    }
}

/// Camera that counts opens, live streams and frame grabs
#[derive(Clone, Default)]
pub struct CountingCamera {
    pub opens: Arc<AtomicUsize>,
    pub live: Arc<AtomicUsize>,
    pub grabs: Arc<AtomicUsize>,
    /// Refuse every open from now on
    pub refuse: Arc<AtomicBool>,
    /// Make frame grabs fail
    pub unplugged: Arc<AtomicBool>,
}

impl CountingCamera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn grabs(&self) -> usize {
        self.grabs.load(Ordering::SeqCst)
    }
}

impl CameraBackend for CountingCamera {
    fn name(&self) -> &str {
        "counting"
    }

    fn open(&self) -> CameraResult<Box<dyn CameraStream>> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(CameraError::PermissionDenied("refused by test".into()));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountingStream {
            camera: self.clone(),
        }))
    }
}

struct CountingStream {
    camera: CountingCamera,
}

impl CameraStream for CountingStream {
    fn device_name(&self) -> &str {
        "counting-0"
    }

    fn current_image(&mut self) -> CameraResult<RgbaImage> {
        if self.camera.unplugged.load(Ordering::SeqCst) {
            return Err(CameraError::Disconnected);
        }
        self.camera.grabs.fetch_add(1, Ordering::SeqCst);
        Ok(test_image())
    }
}

impl Drop for CountingStream {
    fn drop(&mut self) {
        self.camera.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Succeed,
    Fail,
}

/// Separator with a call counter, optionally held until released
#[derive(Clone)]
pub struct MockSeparator {
    outcome: Arc<Mutex<Outcome>>,
    pub calls: Arc<AtomicUsize>,
    /// Cancellation signal handed to each call
    pub signals: Arc<Mutex<Vec<CancelSignal>>>,
    pub frames: Arc<Mutex<Vec<Uuid>>>,
    gate: Option<Arc<Notify>>,
}

impl MockSeparator {
    pub fn new(outcome: Outcome) -> Self {
        Self {
            outcome: Arc::new(Mutex::new(outcome)),
            calls: Arc::new(AtomicUsize::new(0)),
            signals: Arc::new(Mutex::new(Vec::new())),
            frames: Arc::new(Mutex::new(Vec::new())),
            gate: None,
        }
    }

    /// Each call waits for [`MockSeparator::release`] (or cancellation)
    pub fn gated(outcome: Outcome) -> Self {
        Self {
            gate: Some(Arc::new(Notify::new())),
            ..Self::new(outcome)
        }
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn set_outcome(&self, outcome: Outcome) {
        *self.outcome.lock().unwrap() = outcome;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Whether every call so far has been told to stop
    pub fn all_cancelled(&self) -> bool {
        let signals = self.signals.lock().unwrap();
        !signals.is_empty() && signals.iter().all(CancelSignal::is_cancelled)
    }

    pub fn frames(&self) -> Vec<Uuid> {
        self.frames.lock().unwrap().clone()
    }
}

impl BackgroundSeparator for MockSeparator {
    fn name(&self) -> &str {
        "mock"
    }

    fn separate(
        &self,
        frame: CapturedFrame,
        cancel: CancelSignal,
    ) -> BoxFuture<'static, SeparationResult<CutoutImage>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.frames.lock().unwrap().push(frame.id);
        self.signals.lock().unwrap().push(cancel.clone());
        let outcome = *self.outcome.lock().unwrap();
        let gate = self.gate.clone();

        async move {
            if let Some(gate) = gate {
                tokio::select! {
                    _ = gate.notified() => {}
                    _ = cancel.cancelled() => return Err(SeparationError::Cancelled),
                }
            }
            match outcome {
                Outcome::Succeed => {
                    let image = frame.decode()?;
                    Ok(CutoutImage::from_rgba(&frame, &image)?)
                }
                Outcome::Fail => Err(SeparationError::Failed("mock model crashed".into())),
            }
        }
        .boxed()
    }
}

/// Separator whose operation panics instead of returning
#[derive(Clone, Default)]
pub struct PanickingSeparator;

impl BackgroundSeparator for PanickingSeparator {
    fn name(&self) -> &str {
        "panicking"
    }

    fn separate(
        &self,
        _frame: CapturedFrame,
        _cancel: CancelSignal,
    ) -> BoxFuture<'static, SeparationResult<CutoutImage>> {
        async { explode() }.boxed()
    }
}

fn explode() -> SeparationResult<CutoutImage> {
    panic!("segmentation model crashed")
}
