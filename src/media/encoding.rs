// SPDX-License-Identifier: GPL-3.0-only

//! Still image encoding
//!
//! Frames leave the camera as raw RGBA and are handed around encoded:
//! - JPEG for captured frames (lossy, no alpha)
//! - PNG for cutouts (keeps transparency)

use crate::constants::PhotoFormat;
use crate::errors::PhotoError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, RgbaImage};
use tracing::debug;

/// Encode an RGBA image in the requested format
pub fn encode_rgba(
    image: &RgbaImage,
    format: PhotoFormat,
    jpeg_quality: u8,
) -> Result<Vec<u8>, PhotoError> {
    let data = match format {
        PhotoFormat::Jpeg => encode_jpeg(image, jpeg_quality)?,
        PhotoFormat::Png => encode_png(image)?,
    };
    debug!(
        width = image.width(),
        height = image.height(),
        size = data.len(),
        format = format.display_name(),
        "Image encoded"
    );
    Ok(data)
}

/// Encode as JPEG, dropping the alpha channel
fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>, PhotoError> {
    let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);

    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);
    encoder
        .encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| PhotoError::EncodingFailed(format!("JPEG encoding failed: {}", e)))?;

    Ok(buffer)
}

/// Encode as PNG
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, PhotoError> {
    let mut buffer = Vec::new();
    image
        .write_to(
            &mut std::io::Cursor::new(&mut buffer),
            image::ImageFormat::Png,
        )
        .map_err(|e| PhotoError::EncodingFailed(format!("PNG encoding failed: {}", e)))?;
    Ok(buffer)
}

/// Decode any supported still image into RGBA
pub fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage, PhotoError> {
    let image =
        image::load_from_memory(bytes).map_err(|e| PhotoError::DecodingFailed(e.to_string()))?;
    Ok(image.to_rgba8())
}

/// Build a `data:` URI for encoded image bytes
pub fn to_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Split a base64 `data:` URI into its MIME type and payload
pub fn parse_data_uri(uri: &str) -> Result<(String, Vec<u8>), PhotoError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| PhotoError::DecodingFailed("not a data URI".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| PhotoError::DecodingFailed("data URI has no payload".into()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| PhotoError::DecodingFailed("only base64 data URIs are supported".into()))?;
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| PhotoError::DecodingFailed(e.to_string()))?;
    Ok((mime.to_string(), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                image::Rgba([255, 255, 255, 255])
            } else {
                image::Rgba([10, 20, 30, 0])
            }
        })
    }

    #[test]
    fn test_png_keeps_alpha() {
        let image = checker(4, 4);
        let bytes = encode_rgba(&image, PhotoFormat::Png, 90).unwrap();
        let decoded = decode_rgba(&bytes).unwrap();
        assert_eq!(decoded.get_pixel(1, 0).0[3], 0);
        assert_eq!(decoded, image);
    }

    #[test]
    fn test_jpeg_has_magic_bytes() {
        let bytes = encode_rgba(&checker(8, 8), PhotoFormat::Jpeg, 80).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = decode_rgba(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (8, 8));
    }

    #[test]
    fn test_data_uri_parse() {
        let uri = to_data_uri("image/png", &[1, 2, 3]);
        assert!(uri.starts_with("data:image/png;base64,"));
        let (mime, bytes) = parse_data_uri(&uri).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, vec![1, 2, 3]);
        assert!(parse_data_uri("blob:nope").is_err());
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode_rgba(b"definitely not an image").is_err());
    }
}
