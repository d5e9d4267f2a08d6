// SPDX-License-Identifier: MPL-2.0

//! End-to-end wizard scenarios driven through the runtime

mod common;

use common::{CountingCamera, MockSeparator, Outcome, test_config};
use photo_booth::app::{CaptureMode, Control, SeparationState};
use photo_booth::constants::{labels, separation::GENERIC_ERROR};
use photo_booth::{CaptureMessage, Config, Message, SeparationMessage, Step, Wizard, WizardRuntime};
use std::sync::Arc;
use std::time::Duration;

fn runtime(config: Config, camera: &CountingCamera, separator: &MockSeparator) -> WizardRuntime {
    let wizard = Wizard::new(config, Arc::new(camera.clone()), Arc::new(separator.clone())).unwrap();
    WizardRuntime::from_current(wizard).unwrap()
}

/// Count down, capture and confirm the frame
async fn capture_and_confirm(runtime: &mut WizardRuntime) {
    runtime
        .dispatch(Message::Capture(CaptureMessage::TriggerCapture))
        .unwrap();
    runtime.run_until_idle().await.unwrap();
    runtime
        .dispatch(Message::Capture(CaptureMessage::Confirm))
        .unwrap();
    assert_eq!(runtime.wizard().step(), Step::RemoveBackground);
}

async fn remove_background(runtime: &mut WizardRuntime) {
    runtime
        .dispatch(Message::Separation(SeparationMessage::RemoveBackground))
        .unwrap();
    runtime.run_until_idle().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_countdown_then_capture() {
    let camera = CountingCamera::new();
    let separator = MockSeparator::new(Outcome::Succeed);
    let mut runtime = runtime(test_config(), &camera, &separator);
    let start = tokio::time::Instant::now();

    runtime
        .dispatch(Message::Capture(CaptureMessage::TriggerCapture))
        .unwrap();

    let mut shown = Vec::new();
    loop {
        let capture = runtime.wizard().capture().unwrap();
        shown.push(capture.countdown_display());
        if !runtime.step().await.unwrap() {
            break;
        }
    }

    assert_eq!(shown, vec![Some(2), Some(1), None]);
    let capture = runtime.wizard().capture().unwrap();
    assert_eq!(capture.mode(), CaptureMode::FramePresent);
    assert!(capture.frame().is_some());
    assert_eq!(camera.grabs(), 1);
    assert!(start.elapsed() >= Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_confirmed_frame_reaches_separation() {
    let camera = CountingCamera::new();
    let separator = MockSeparator::new(Outcome::Succeed);
    let mut runtime = runtime(test_config(), &camera, &separator);

    capture_and_confirm(&mut runtime).await;

    let frame = runtime.wizard().frame().unwrap().clone();
    let separation = runtime.wizard().separation().unwrap();
    assert!(separation.frame().same_frame(&frame));
    assert!(separation.controls().confirm.is_none());

    remove_background(&mut runtime).await;

    assert_eq!(separator.frames(), vec![frame.id]);
    let separation = runtime.wizard().separation().unwrap();
    assert!(matches!(separation.state(), SeparationState::Ready { .. }));
    assert_eq!(separation.error(), None);
    assert!(!separation.is_processing());
    assert_eq!(
        separation.controls().confirm,
        Some(Control::enabled(labels::CONTINUE))
    );
    let cutout = separation.cutout().unwrap();
    assert_eq!(cutout.source_frame, frame.id);
    assert!(separation.cutout_url().unwrap().as_str().starts_with("blob:"));

    runtime
        .dispatch(Message::Separation(SeparationMessage::Confirm))
        .unwrap();
    assert!(runtime.wizard().finished());
    assert_eq!(runtime.wizard().cutout().unwrap().source_frame, frame.id);
    // The chain ends here
    assert_eq!(runtime.wizard().step(), Step::RemoveBackground);
}

#[tokio::test(start_paused = true)]
async fn test_failed_separation_shows_generic_error() {
    let camera = CountingCamera::new();
    let separator = MockSeparator::new(Outcome::Fail);
    let mut runtime = runtime(test_config(), &camera, &separator);

    capture_and_confirm(&mut runtime).await;
    remove_background(&mut runtime).await;

    let separation = runtime.wizard().separation().unwrap();
    assert_eq!(separation.error(), Some(GENERIC_ERROR));
    assert_eq!(separation.error(), Some("Something went wrong. Please try again."));
    assert!(!separation.is_processing());
    assert!(separation.cutout().is_none());
    let controls = separation.controls();
    assert_eq!(
        controls.remove_background,
        Some(Control::enabled(labels::REMOVE_BACKGROUND))
    );
    assert!(controls.confirm.is_none());

    // Confirm without a cutout does nothing
    runtime
        .dispatch(Message::Separation(SeparationMessage::Confirm))
        .unwrap();
    assert!(!runtime.wizard().finished());
    // The original frame is still there
    assert!(runtime.wizard().separation().unwrap().frame().decode().is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_retry_after_failure_succeeds() {
    let camera = CountingCamera::new();
    let separator = MockSeparator::new(Outcome::Fail);
    let mut runtime = runtime(test_config(), &camera, &separator);

    capture_and_confirm(&mut runtime).await;
    remove_background(&mut runtime).await;
    assert!(runtime.wizard().separation().unwrap().error().is_some());

    separator.set_outcome(Outcome::Succeed);
    runtime
        .dispatch(Message::Separation(SeparationMessage::RemoveBackground))
        .unwrap();
    // A new attempt clears the previous error straight away
    let separation = runtime.wizard().separation().unwrap();
    assert!(separation.is_processing());
    assert_eq!(separation.error(), None);
    assert_eq!(
        separation.controls().remove_background,
        Some(Control::disabled(labels::PROCESSING))
    );

    runtime.run_until_idle().await.unwrap();
    let separation = runtime.wizard().separation().unwrap();
    assert!(separation.cutout().is_some());
    assert_eq!(separation.error(), None);
    assert_eq!(separator.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_back_from_failed_returns_to_capture() {
    let camera = CountingCamera::new();
    let separator = MockSeparator::new(Outcome::Fail);
    let mut runtime = runtime(test_config(), &camera, &separator);

    capture_and_confirm(&mut runtime).await;
    remove_background(&mut runtime).await;

    runtime
        .dispatch(Message::Separation(SeparationMessage::Back))
        .unwrap();
    assert_eq!(runtime.wizard().step(), Step::Capture);
    let capture = runtime.wizard().capture().unwrap();
    // Remounted fresh
    assert_eq!(capture.mode(), CaptureMode::Live);
    assert_eq!(camera.opens(), 2);
    // The orchestrator still holds the frame artifact
    assert!(runtime.wizard().frame().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_back_disallowed_while_processing() {
    let camera = CountingCamera::new();
    let separator = MockSeparator::gated(Outcome::Succeed);
    let mut runtime = runtime(test_config(), &camera, &separator);

    capture_and_confirm(&mut runtime).await;
    runtime
        .dispatch(Message::Separation(SeparationMessage::RemoveBackground))
        .unwrap();

    let separation = runtime.wizard().separation().unwrap();
    assert_eq!(separation.controls().back, Control::disabled(labels::BACK));
    runtime
        .dispatch(Message::Separation(SeparationMessage::Back))
        .unwrap();
    assert_eq!(runtime.wizard().step(), Step::RemoveBackground);
    assert!(runtime.wizard().separation().unwrap().is_processing());

    separator.release();
    runtime.run_until_idle().await.unwrap();
    let separation = runtime.wizard().separation().unwrap();
    assert!(separation.cutout().is_some());
    assert!(separation.controls().back.enabled);
}

#[tokio::test(start_paused = true)]
async fn test_back_keeps_frame_when_configured() {
    let camera = CountingCamera::new();
    let separator = MockSeparator::new(Outcome::Succeed);
    let config = Config {
        keep_frame_on_back: true,
        ..test_config()
    };
    let mut runtime = runtime(config, &camera, &separator);

    capture_and_confirm(&mut runtime).await;
    let frame = runtime.wizard().frame().unwrap().clone();
    runtime
        .dispatch(Message::Separation(SeparationMessage::Back))
        .unwrap();

    let capture = runtime.wizard().capture().unwrap();
    assert_eq!(capture.mode(), CaptureMode::FramePresent);
    assert!(capture.frame().unwrap().same_frame(&frame));

    // Confirming again builds a fresh separation step for the same frame
    runtime
        .dispatch(Message::Capture(CaptureMessage::Confirm))
        .unwrap();
    let separation = runtime.wizard().separation().unwrap();
    assert!(separation.frame().same_frame(&frame));
    assert!(matches!(separation.state(), SeparationState::Idle));
}

#[tokio::test(start_paused = true)]
async fn test_immediate_capture_without_countdown() {
    let camera = CountingCamera::new();
    let separator = MockSeparator::new(Outcome::Succeed);
    let config = Config {
        countdown_seconds: 0,
        ..test_config()
    };
    let mut runtime = runtime(config, &camera, &separator);

    runtime
        .dispatch(Message::Capture(CaptureMessage::TriggerCapture))
        .unwrap();
    assert!(runtime.is_idle());
    assert_eq!(
        runtime.wizard().capture().unwrap().mode(),
        CaptureMode::FramePresent
    );
}
