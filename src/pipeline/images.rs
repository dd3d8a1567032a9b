//! Cropped sub-images for image/figure regions.
//!
//! Callers that want the raster content of a page — figures, photographs,
//! charts — get it by cropping the source page image to each image-like
//! block's bounding box. Names must be stable across repeated renders of
//! the same markup and unique across blocks within one page, so they derive
//! from a hash of the raw markup plus the block index.

use crate::output::ExtractedImage;
use crate::pipeline::layout::{BlockKind, LayoutBlock};
use image::DynamicImage;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use sha2::{Digest, Sha256};

static IMG_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

/// Deterministic name for the image of the block at `block_index`.
///
/// `block_index` is 1-based and counts all top-level blocks, not just
/// image ones, so keys stay stable if the hash function is ever swapped.
pub fn image_name(markup: &str, block_index: usize) -> String {
    let digest = Sha256::digest(markup.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    format!("{hex}_{block_index}_img")
}

/// Crop the source image for every `Image`/`Figure` block that embeds an
/// image reference.
///
/// Blocks without a detectable `<img>` in their fragment are skipped
/// entirely (no entry). Output order follows block order.
pub fn extract_images(
    markup: &str,
    blocks: &[LayoutBlock],
    source: &DynamicImage,
) -> Vec<ExtractedImage> {
    let mut out = Vec::new();

    for (idx, block) in blocks.iter().enumerate() {
        let block_index = idx + 1;
        if !matches!(block.kind(), BlockKind::Image | BlockKind::Figure) {
            continue;
        }

        let fragment = Html::parse_fragment(&block.content);
        if fragment.select(&IMG_SELECTOR).next().is_none() {
            continue;
        }

        let [x0, y0, x1, y1] = block.bbox;
        let cropped = source.crop_imm(x0, y0, (x1 - x0).max(1), (y1 - y0).max(1));
        out.push(ExtractedImage {
            name: image_name(markup, block_index),
            image: cropped,
        });
    }

    out
}
