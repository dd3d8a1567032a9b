//! Output types produced by the pipeline.
//!
//! Everything here is transient per call and owned by the caller: one
//! [`GenerationResult`] per (possibly retried) inference attempt, one
//! [`PageResult`] per page after assembly, and one [`ExtractedImage`] per
//! cropped figure region. No on-disk state is owned by this crate.

use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Raw outcome of one orchestrated inference item.
///
/// `failed = true` records a transport/endpoint failure that survived all
/// retries; the orchestrator never raises it as an error, because sibling
/// items in the batch are independent and a partial batch is still useful.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Block-annotated markup as emitted by the model. Empty when `failed`.
    pub raw: String,
    /// Completion tokens reported by the endpoint. Zero when `failed`.
    pub token_count: u32,
    /// The final attempt raised a transport/endpoint error.
    pub failed: bool,
}

impl GenerationResult {
    /// The result recorded when an inference call errors.
    pub fn failure() -> Self {
        Self {
            raw: String::new(),
            token_count: 0,
            failed: true,
        }
    }
}

/// One layout region of a page with its extracted, type-appropriate text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Pixel bounding box `[x0, y0, x1, y1]`, clamped to the page image.
    pub bbox: [u32; 4],
    /// Semantic region type as emitted by the model (e.g. `Text`, `Table`).
    pub category: String,
    /// Text view of the region: plain text, table HTML, or LaTeX depending
    /// on the category; empty for image regions.
    pub text: String,
}

/// Fully reconstructed result for one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    /// Position of this page in the input batch.
    pub page_index: usize,
    /// Width of the source page image in pixels.
    pub width: u32,
    /// Height of the source page image in pixels.
    pub height: u32,
    /// Layout regions in reading order, with typed text extracts.
    pub cells: Vec<Cell>,
    /// Markdown view of the whole page.
    pub markdown: String,
    /// The raw model markup the views were derived from.
    pub raw: String,
    /// Completion tokens spent on this page (last attempt only).
    pub token_count: u32,
    /// Generation failed for this page after all retries; `cells` and
    /// `markdown` are empty.
    pub failed: bool,
}

/// A cropped sub-image for one `Image`/`Figure` block.
///
/// `name` is derived from a hash of the page markup plus the block index,
/// so repeated renders of the same markup produce identical names and
/// distinct blocks within one page never collide.
#[derive(Debug, Clone)]
pub struct ExtractedImage {
    pub name: String,
    pub image: DynamicImage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_result_is_empty() {
        let r = GenerationResult::failure();
        assert!(r.failed);
        assert!(r.raw.is_empty());
        assert_eq!(r.token_count, 0);
    }

    #[test]
    fn cell_serialises_bbox_as_array() {
        let cell = Cell {
            bbox: [1, 2, 3, 4],
            category: "Text".into(),
            text: "hello".into(),
        };
        let json = serde_json::to_string(&cell).unwrap();
        assert!(json.contains("[1,2,3,4]"), "got: {json}");
    }
}
