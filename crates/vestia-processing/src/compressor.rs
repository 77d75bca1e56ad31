//! Bounded-edge JPEG re-encoding.
//!
//! Compression is deterministic for identical inputs and settings. When the
//! decode or encode fails the original bytes are passed through unmodified
//! with `passed_through` set; the caller must re-validate size in that case
//! instead of trusting that compression ran.

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use std::io::Cursor;

/// Resize/quality parameters for one compression pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionSettings {
    /// Maximum length of the longest edge, in pixels.
    pub max_edge: u32,
    /// JPEG quality, 1-100.
    pub quality: u8,
}

impl CompressionSettings {
    /// Pre-preview pass.
    pub const PREVIEW: Self = Self {
        max_edge: 2048,
        quality: 80,
    };

    /// Pre-submission pass.
    pub const SUBMISSION: Self = Self {
        max_edge: 1500,
        quality: 85,
    };
}

/// Output of one compression pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedImage {
    pub data: Bytes,
    /// True when re-encoding failed and `data` is the untouched input. The
    /// bytes then keep their original format and may exceed the size the
    /// settings would normally guarantee.
    pub passed_through: bool,
}

impl CompressedImage {
    /// Content type of `data`.
    pub fn content_type<'a>(&self, original: &'a str) -> &'a str {
        if self.passed_through {
            original
        } else {
            "image/jpeg"
        }
    }
}

/// Re-encode `data` as JPEG with its longest edge bounded by
/// `settings.max_edge`. Never fails: on any decode/encode error the original
/// bytes are passed through with the flag set.
pub fn compress(data: &[u8], settings: CompressionSettings) -> CompressedImage {
    match reencode(data, settings) {
        Ok(encoded) => CompressedImage {
            data: encoded,
            passed_through: false,
        },
        Err(err) => {
            tracing::warn!(
                error = %err,
                max_edge = settings.max_edge,
                quality = settings.quality,
                "image re-encode failed, passing original bytes through"
            );
            CompressedImage {
                data: Bytes::copy_from_slice(data),
                passed_through: true,
            }
        }
    }
}

fn reencode(data: &[u8], settings: CompressionSettings) -> Result<Bytes, image::ImageError> {
    let img = image::load_from_memory(data)?;

    let (width, height) = img.dimensions();
    let img = if width.max(height) > settings.max_edge {
        img.resize(settings.max_edge, settings.max_edge, FilterType::Lanczos3)
    } else {
        img
    };

    // JPEG has no alpha channel; flatten before encoding.
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, settings.quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)?;

    Ok(Bytes::from(buffer.into_inner()))
}
