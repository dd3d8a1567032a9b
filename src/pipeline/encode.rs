//! Image preparation: pixel-budget scaling and base64 PNG encoding.
//!
//! Vision endpoints accept images as base64 data-URIs embedded in the JSON
//! request body. PNG is chosen over JPEG because it is lossless — text
//! crispness matters far more than file size for OCR accuracy.
//!
//! The model also has a pixel budget: oversized pages waste vision tokens
//! and undersized crops fall below the patch grid. [`scale_to_fit`] bounds
//! the total pixel count on both sides while preserving aspect ratio.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{imageops::FilterType, DynamicImage};
use std::io::Cursor;
use tracing::debug;

/// Upper pixel budget (width × height product of 3072 × 2048).
pub const MAX_SIZE: (u32, u32) = (3072, 2048);

/// Lower pixel budget (one 28 × 28 vision patch).
pub const MIN_SIZE: (u32, u32) = (28, 28);

/// Scale an image into the model's pixel budget, preserving aspect ratio.
///
/// Images whose pixel count already lies within
/// `MIN_SIZE.0 * MIN_SIZE.1 ..= MAX_SIZE.0 * MAX_SIZE.1` are returned
/// unchanged (cloned). Oversized images round dimensions down, undersized
/// ones round up, so the result never re-crosses the budget boundary.
pub fn scale_to_fit(img: &DynamicImage) -> DynamicImage {
    let (width, height) = (img.width(), img.height());
    if width == 0 || height == 0 {
        return img.clone();
    }

    let current = u64::from(width) * u64::from(height);
    let max_pixels = u64::from(MAX_SIZE.0) * u64::from(MAX_SIZE.1);
    let min_pixels = u64::from(MIN_SIZE.0) * u64::from(MIN_SIZE.1);

    let (new_width, new_height) = if current > max_pixels {
        let factor = (max_pixels as f64 / current as f64).sqrt();
        (
            (f64::from(width) * factor).floor() as u32,
            (f64::from(height) * factor).floor() as u32,
        )
    } else if current < min_pixels {
        let factor = (min_pixels as f64 / current as f64).sqrt();
        (
            (f64::from(width) * factor).ceil() as u32,
            (f64::from(height) * factor).ceil() as u32,
        )
    } else {
        return img.clone();
    };

    debug!(
        "Scaling page image {}x{} -> {}x{}",
        width, height, new_width, new_height
    );
    img.resize_exact(new_width.max(1), new_height.max(1), FilterType::Lanczos3)
}

/// Encode an image as base64 PNG for the request body.
pub fn to_base64_png(img: &DynamicImage) -> Result<String, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(STANDARD.encode(&buf))
}
