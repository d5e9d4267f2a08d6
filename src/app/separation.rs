// SPDX-License-Identifier: GPL-3.0-only

//! Background separation step
//!
//! ```text
//! Idle --RemoveBackground--> Processing --Ok--> Ready --Confirm--> (orchestrator)
//!                              |    ^
//!                             Err   +--RemoveBackground-- Failed
//!                              +-----------------------------^
//! Back from any state but Processing --> (orchestrator)
//! ```
//!
//! One controller is built per captured frame and never re-targeted.
//! Dropping it cancels any in-flight operation and revokes the cutout URL.

use super::state::{Control, SeparationControls, SeparationMessage, SeparationState, StepEvent};
use super::task::{Action, Task};
use crate::backends::camera::CapturedFrame;
use crate::backends::separation::{
    BackgroundSeparator, CancelHandle, CutoutImage, SeparationResult, run_cancellable,
};
use crate::constants::{labels, separation::CUTOUT_MIME, separation::GENERIC_ERROR};
use crate::errors::SeparationError;
use crate::media::{ObjectUrl, ObjectUrlStore};
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

pub struct SeparationController {
    frame: CapturedFrame,
    separator: Arc<dyn BackgroundSeparator>,
    urls: ObjectUrlStore,
    state: SeparationState,
    cancel: CancelHandle,
}

impl SeparationController {
    pub fn new(
        frame: CapturedFrame,
        separator: Arc<dyn BackgroundSeparator>,
        urls: ObjectUrlStore,
    ) -> Self {
        info!(frame = %frame.id, separator = separator.name(), "Separation step mounted");
        Self {
            frame,
            separator,
            urls,
            state: SeparationState::Idle,
            cancel: CancelHandle::new(),
        }
    }

    /// The frame this controller works on; always shown as "Original"
    pub fn frame(&self) -> &CapturedFrame {
        &self.frame
    }

    pub fn state(&self) -> &SeparationState {
        &self.state
    }

    pub fn is_processing(&self) -> bool {
        self.state.is_processing()
    }

    pub fn cutout(&self) -> Option<&CutoutImage> {
        self.state.cutout()
    }

    /// Display URL of the cutout while one is ready
    pub fn cutout_url(&self) -> Option<&ObjectUrl> {
        match &self.state {
            SeparationState::Ready { url, .. } => Some(url),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&'static str> {
        self.state.error()
    }

    pub fn controls(&self) -> SeparationControls {
        let processing = self.is_processing();
        let back = Control {
            label: labels::BACK,
            enabled: !processing,
        };
        match &self.state {
            SeparationState::Ready { .. } => SeparationControls {
                back,
                remove_background: None,
                confirm: Some(Control::enabled(labels::CONTINUE)),
            },
            SeparationState::Processing { .. } => SeparationControls {
                back,
                remove_background: Some(Control::disabled(labels::PROCESSING)),
                confirm: None,
            },
            SeparationState::Idle | SeparationState::Failed { .. } => SeparationControls {
                back,
                remove_background: Some(Control::enabled(labels::REMOVE_BACKGROUND)),
                confirm: None,
            },
        }
    }

    /// Text for the cutout panel
    pub fn status_text(&self) -> &'static str {
        match &self.state {
            SeparationState::Ready { .. } => labels::CUTOUT_READY,
            SeparationState::Processing { .. } => labels::CUTOUT_PROCESSING,
            SeparationState::Idle | SeparationState::Failed { .. } => labels::CUTOUT_PLACEHOLDER,
        }
    }

    pub fn update(&mut self, message: SeparationMessage) -> Action<SeparationMessage> {
        match message {
            SeparationMessage::RemoveBackground => self.handle_remove_background(),
            SeparationMessage::Finished { attempt, result } => {
                self.handle_finished(attempt, result);
                Action::None
            }
            SeparationMessage::Confirm => self.handle_confirm(),
            SeparationMessage::Back => self.handle_back(),
        }
    }

    fn handle_remove_background(&mut self) -> Action<SeparationMessage> {
        match &self.state {
            SeparationState::Processing { .. } => {
                debug!("Separation already in flight");
                return Action::None;
            }
            SeparationState::Ready { .. } => {
                debug!("Cutout already available");
                return Action::None;
            }
            SeparationState::Idle | SeparationState::Failed { .. } => {}
        }

        let attempt = Uuid::new_v4();
        info!(%attempt, frame = %self.frame.id, "Removing background");
        // Entering Processing also clears any previous error
        self.state = SeparationState::Processing { attempt };

        let signal = self.cancel.signal();
        let operation = self.separator.separate(self.frame.clone(), signal.clone());
        Action::Task(Task::perform(
            run_cancellable(operation, signal),
            move |result| SeparationMessage::Finished { attempt, result },
        ))
    }

    fn handle_finished(&mut self, attempt: Uuid, result: SeparationResult<CutoutImage>) {
        match &self.state {
            SeparationState::Processing { attempt: active } if *active == attempt => {}
            _ => {
                debug!(%attempt, "Ignoring outcome of an inactive attempt");
                return;
            }
        }

        self.state = match result {
            Ok(cutout) => {
                let url = self.urls.create(cutout.data.clone(), CUTOUT_MIME);
                info!(%attempt, cutout = %cutout.id, %url, "Background removed");
                SeparationState::Ready { cutout, url }
            }
            Err(SeparationError::Cancelled) if self.cancel.is_cancelled() => {
                debug!(%attempt, "Separation cancelled");
                SeparationState::Idle
            }
            Err(err) => {
                // Full cause goes to the log only
                error!(%attempt, %err, "Background removal failed");
                SeparationState::Failed {
                    message: GENERIC_ERROR,
                }
            }
        };
    }

    fn handle_confirm(&mut self) -> Action<SeparationMessage> {
        match self.state.cutout() {
            Some(cutout) => {
                info!(cutout = %cutout.id, "Cutout confirmed");
                Action::Event(StepEvent::SeparationConfirmed(cutout.clone()))
            }
            None => {
                debug!(state = self.state.name(), "Confirm ignored: no cutout");
                Action::None
            }
        }
    }

    fn handle_back(&mut self) -> Action<SeparationMessage> {
        if self.is_processing() {
            debug!("Back ignored while processing");
            return Action::None;
        }
        Action::Event(StepEvent::BackRequested)
    }
}

impl Drop for SeparationController {
    fn drop(&mut self) {
        if self.is_processing() {
            info!("Separation step unmounted mid-flight, cancelling");
        }
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::separation::CancelSignal;
    use crate::constants::PhotoFormat;
    use futures::FutureExt;
    use futures::future::BoxFuture;
    use image::RgbaImage;

    struct Fixed(Result<(), SeparationError>);

    impl BackgroundSeparator for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn separate(
            &self,
            frame: CapturedFrame,
            _cancel: CancelSignal,
        ) -> BoxFuture<'static, SeparationResult<CutoutImage>> {
            let outcome = self.0.clone();
            async move {
                outcome?;
                let image = RgbaImage::from_pixel(frame.width, frame.height, image::Rgba([0; 4]));
                Ok(CutoutImage::from_rgba(&frame, &image)?)
            }
            .boxed()
        }
    }

    fn controller(outcome: Result<(), SeparationError>) -> (SeparationController, ObjectUrlStore) {
        let image = RgbaImage::from_pixel(2, 2, image::Rgba([5, 5, 5, 255]));
        let frame = CapturedFrame::encode(&image, PhotoFormat::Png, 90).unwrap();
        let urls = ObjectUrlStore::new();
        let controller = SeparationController::new(frame, Arc::new(Fixed(outcome)), urls.clone());
        (controller, urls)
    }

    async fn run(controller: &mut SeparationController) {
        let Action::Task(task) = controller.update(SeparationMessage::RemoveBackground) else {
            panic!("expected a separation task");
        };
        assert!(controller.is_processing());
        let message = task.resolve().await.unwrap();
        assert!(controller.update(message).is_none());
    }

    #[tokio::test]
    async fn test_success_reaches_ready() {
        let (mut controller, urls) = controller(Ok(()));
        run(&mut controller).await;

        assert!(controller.cutout().is_some());
        assert!(controller.error().is_none());
        assert_eq!(urls.live_count(), 1);
        let controls = controller.controls();
        assert_eq!(controls.confirm, Some(Control::enabled(labels::CONTINUE)));
        assert!(controls.remove_background.is_none());

        drop(controller);
        assert_eq!(urls.live_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_is_generic_and_retryable() {
        let (mut controller, urls) = controller(Err(SeparationError::Failed("model exploded".into())));
        run(&mut controller).await;

        assert_eq!(controller.error(), Some(GENERIC_ERROR));
        assert!(controller.cutout().is_none());
        assert!(!controller.is_processing());
        assert_eq!(urls.live_count(), 0);
        assert_eq!(
            controller.controls().remove_background,
            Some(Control::enabled(labels::REMOVE_BACKGROUND))
        );
        assert!(controller.controls().confirm.is_none());
    }

    #[tokio::test]
    async fn test_no_second_task_while_processing() {
        let (mut controller, _urls) = controller(Ok(()));
        let first = controller.update(SeparationMessage::RemoveBackground);
        assert!(matches!(first, Action::Task(_)));
        assert!(controller.update(SeparationMessage::RemoveBackground).is_none());
        assert!(controller.update(SeparationMessage::Back).is_none());
        assert!(controller.update(SeparationMessage::Confirm).is_none());
        assert_eq!(
            controller.controls().back,
            Control::disabled(labels::BACK)
        );
    }

    #[tokio::test]
    async fn test_stale_outcome_ignored() {
        let (mut controller, _urls) = controller(Ok(()));
        controller.update(SeparationMessage::Finished {
            attempt: Uuid::new_v4(),
            result: Err(SeparationError::Failed("late".into())),
        });
        assert!(matches!(controller.state(), SeparationState::Idle));
    }
}
