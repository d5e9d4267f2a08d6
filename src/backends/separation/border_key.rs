// SPDX-License-Identifier: GPL-3.0-only

//! Border colour keying
//!
//! Estimates the backdrop colour from a band along the frame edges and makes
//! every pixel close to it transparent, with a linear soft edge. Works well
//! for the conditions the capture step asks for: plain background, good light.

use super::{BackgroundSeparator, CancelSignal, CutoutImage, SeparationResult};
use crate::backends::camera::CapturedFrame;
use crate::config::SeparationSettings;
use crate::errors::SeparationError;
use futures::FutureExt;
use futures::future::BoxFuture;
use image::RgbaImage;
use tracing::{debug, info};

/// Built-in separator keying out the border colour
#[derive(Debug, Clone, Copy)]
pub struct BorderKeySeparator {
    settings: SeparationSettings,
}

impl BorderKeySeparator {
    pub fn new(settings: SeparationSettings) -> Self {
        Self { settings }
    }
}

impl Default for BorderKeySeparator {
    fn default() -> Self {
        Self::new(SeparationSettings::default())
    }
}

/// Mean RGB of the pixels within `border` of any edge
pub fn estimate_background(image: &RgbaImage, border: u32) -> [f32; 3] {
    let (width, height) = image.dimensions();
    let border = border.max(1);
    let mut sum = [0f64; 3];
    let mut count = 0u64;

    for (x, y, pixel) in image.enumerate_pixels() {
        let on_border = x < border
            || y < border
            || x >= width.saturating_sub(border)
            || y >= height.saturating_sub(border);
        if on_border {
            for (acc, channel) in sum.iter_mut().zip(pixel.0.iter()) {
                *acc += *channel as f64;
            }
            count += 1;
        }
    }

    if count == 0 {
        return [0.0; 3];
    }
    sum.map(|s| (s / count as f64) as f32)
}

/// Alpha for a pixel at colour distance `distance` from the backdrop
fn key_alpha(distance: f32, tolerance: f32, feather: f32) -> u8 {
    if distance <= tolerance {
        0
    } else if feather > 0.0 && distance < tolerance + feather {
        (((distance - tolerance) / feather) * 255.0).round() as u8
    } else {
        255
    }
}

/// Rewrite alpha in place; returns how many pixels kept any opacity
pub fn key_out(image: &mut RgbaImage, background: [f32; 3], tolerance: f32, feather: f32) -> usize {
    let mut opaque = 0;
    for pixel in image.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let distance = ((r as f32 - background[0]).powi(2)
            + (g as f32 - background[1]).powi(2)
            + (b as f32 - background[2]).powi(2))
        .sqrt();
        let alpha = key_alpha(distance, tolerance, feather).min(a);
        pixel.0[3] = alpha;
        if alpha > 0 {
            opaque += 1;
        }
    }
    opaque
}

fn separate_blocking(
    frame: CapturedFrame,
    settings: SeparationSettings,
    cancel: CancelSignal,
) -> SeparationResult<CutoutImage> {
    if cancel.is_cancelled() {
        return Err(SeparationError::Cancelled);
    }

    let mut image = frame.decode()?;
    if image.width() == 0 || image.height() == 0 {
        return Err(SeparationError::InvalidInput("empty frame".into()));
    }

    let background = estimate_background(&image, settings.border_width);
    debug!(?background, "Estimated background colour");

    let kept = key_out(
        &mut image,
        background,
        settings.tolerance,
        settings.feather,
    );
    if kept == 0 {
        return Err(SeparationError::Failed(
            "no subject found: every pixel matched the background".into(),
        ));
    }

    if cancel.is_cancelled() {
        return Err(SeparationError::Cancelled);
    }

    let total = (image.width() * image.height()) as usize;
    info!(kept, total, "Background keyed out");
    CutoutImage::from_rgba(&frame, &image).map_err(|e| SeparationError::Failed(e.to_string()))
}

impl BackgroundSeparator for BorderKeySeparator {
    fn name(&self) -> &str {
        "border-key"
    }

    fn separate(
        &self,
        frame: CapturedFrame,
        cancel: CancelSignal,
    ) -> BoxFuture<'static, SeparationResult<CutoutImage>> {
        let settings = self.settings;
        async move {
            // Pixel work is CPU-bound
            tokio::task::spawn_blocking(move || separate_blocking(frame, settings, cancel))
                .await
                .map_err(|e| SeparationError::Failed(format!("separation task error: {}", e)))?
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PhotoFormat;
    use image::Rgba;

    /// Green backdrop with a red square in the middle
    fn subject_on_backdrop() -> RgbaImage {
        RgbaImage::from_fn(32, 32, |x, y| {
            if (10..22).contains(&x) && (10..22).contains(&y) {
                Rgba([220, 30, 30, 255])
            } else {
                Rgba([20, 200, 40, 255])
            }
        })
    }

    #[test]
    fn test_estimate_background_uses_border() {
        let bg = estimate_background(&subject_on_backdrop(), 4);
        assert!((bg[0] - 20.0).abs() < 0.5);
        assert!((bg[1] - 200.0).abs() < 0.5);
    }

    #[test]
    fn test_key_alpha_ramp() {
        assert_eq!(key_alpha(10.0, 20.0, 10.0), 0);
        assert_eq!(key_alpha(25.0, 20.0, 10.0), 128);
        assert_eq!(key_alpha(40.0, 20.0, 10.0), 255);
        assert_eq!(key_alpha(20.5, 20.0, 0.0), 255);
    }

    #[tokio::test]
    async fn test_separates_subject() {
        let frame = CapturedFrame::encode(&subject_on_backdrop(), PhotoFormat::Png, 90).unwrap();
        let cutout = BorderKeySeparator::default()
            .separate(frame.clone(), CancelSignal::never())
            .await
            .unwrap();

        assert_eq!(cutout.source_frame, frame.id);
        let pixels = cutout.decode().unwrap();
        assert_eq!(pixels.get_pixel(0, 0).0[3], 0);
        assert_eq!(pixels.get_pixel(16, 16).0[3], 255);
    }

    #[tokio::test]
    async fn test_uniform_frame_fails() {
        let plain = RgbaImage::from_pixel(16, 16, Rgba([90, 90, 90, 255]));
        let frame = CapturedFrame::encode(&plain, PhotoFormat::Png, 90).unwrap();
        let result = BorderKeySeparator::default()
            .separate(frame, CancelSignal::never())
            .await;
        assert!(matches!(result, Err(SeparationError::Failed(_))));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let handle = super::super::CancelHandle::new();
        let signal = handle.signal();
        handle.cancel();
        let frame = CapturedFrame::encode(&subject_on_backdrop(), PhotoFormat::Png, 90).unwrap();
        let result = BorderKeySeparator::default().separate(frame, signal).await;
        assert_eq!(result.unwrap_err(), SeparationError::Cancelled);
    }
}
