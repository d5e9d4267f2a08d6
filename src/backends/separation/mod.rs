// SPDX-License-Identifier: MPL-2.0

//! Subject/background separation backends
//!
//! The separation operation is a black box: one frame in, one cutout (or an
//! error) out, no progress reporting. Every call still receives a
//! [`CancelSignal`] so an implementation that can stop early may do so; the
//! caller also races the returned future against the signal with
//! [`run_cancellable`].

pub mod border_key;

pub use border_key::BorderKeySeparator;

use crate::backends::camera::CapturedFrame;
use crate::constants::separation::CUTOUT_MIME;
use crate::errors::{PhotoError, SeparationError};
use crate::media::encoding;
use futures::FutureExt;
use futures::future::BoxFuture;
use image::RgbaImage;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

pub type SeparationResult<T> = Result<T, SeparationError>;

/// Subject-only image derived from exactly one captured frame
///
/// Always PNG-encoded so the removed background stays transparent.
#[derive(Clone)]
pub struct CutoutImage {
    pub id: Uuid,
    /// Id of the [`CapturedFrame`] this cutout was made from
    pub source_frame: Uuid,
    pub data: Arc<[u8]>,
    pub width: u32,
    pub height: u32,
}

impl CutoutImage {
    pub fn from_rgba(source: &CapturedFrame, image: &RgbaImage) -> Result<Self, PhotoError> {
        let data = encoding::encode_png(image)?;
        Ok(Self {
            id: Uuid::new_v4(),
            source_frame: source.id,
            data: Arc::from(data),
            width: image.width(),
            height: image.height(),
        })
    }

    pub fn mime_type(&self) -> &'static str {
        CUTOUT_MIME
    }

    pub fn to_data_uri(&self) -> String {
        encoding::to_data_uri(CUTOUT_MIME, &self.data)
    }

    pub fn decode(&self) -> Result<RgbaImage, PhotoError> {
        encoding::decode_rgba(&self.data)
    }
}

impl std::fmt::Debug for CutoutImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CutoutImage")
            .field("id", &self.id)
            .field("source_frame", &self.source_frame)
            .field("size", &format_args!("{}x{}", self.width, self.height))
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// External subject/background separation operation
pub trait BackgroundSeparator: Send + Sync {
    fn name(&self) -> &str;

    /// Start separating `frame`
    ///
    /// The returned future owns everything it needs; it may keep running
    /// after the caller stops caring, unless it watches `cancel`.
    fn separate(
        &self,
        frame: CapturedFrame,
        cancel: CancelSignal,
    ) -> BoxFuture<'static, SeparationResult<CutoutImage>>;
}

/// Owner side of a cancellation signal; cancels when dropped
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self { sender }
    }

    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CancelHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Observer side of a cancellation signal
#[derive(Debug, Clone)]
pub struct CancelSignal {
    receiver: watch::Receiver<bool>,
}

impl CancelSignal {
    /// A signal that never fires
    pub fn never() -> Self {
        let (_, receiver) = watch::channel(false);
        Self { receiver }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once cancellation is requested; pends forever otherwise
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        if receiver.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Drive a separation future, giving up as soon as `cancel` fires
pub async fn run_cancellable(
    operation: BoxFuture<'static, SeparationResult<CutoutImage>>,
    cancel: CancelSignal,
) -> SeparationResult<CutoutImage> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SeparationError::Cancelled),
        result = AssertUnwindSafe(operation).catch_unwind() => {
            result.unwrap_or_else(|panic| Err(SeparationError::Failed(panic_message(panic.as_ref()))))
        }
    }
}

/// A panicking separator is reported as an ordinary failure
fn panic_message(panic: &(dyn Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown cause".to_string());
    format!("separator panicked: {}", detail)
}
