//! Top-level conversion entry points.
//!
//! These functions tie the pipeline together: orchestrated generation over
//! a batch of page images, then per-page assembly of the structured views
//! (layout cells, typed text, markdown) from each raw completion.
//!
//! Assembly is pure and per-page. A page whose generation failed yields a
//! [`PageResult`] with `failed = true` and empty views rather than an
//! error, so callers can always index results by page.

use crate::client::VisionClient;
use crate::config::OcrConfig;
use crate::output::{Cell, GenerationResult, PageResult};
use crate::pipeline::generate::{generate_batch, GenerationRequest};
use crate::pipeline::layout::parse_layout;
use crate::pipeline::render::render_markdown;
use crate::pipeline::text::extract_cell_text;
use crate::prompts::PromptKind;
use image::DynamicImage;
use std::sync::Arc;
use tracing::{debug, info};

/// Convert a batch of page images into structured page results.
///
/// Results are index-aligned with `images`. Per-page failures are recorded
/// on the affected [`PageResult`], never raised.
pub async fn parse_images(
    client: &Arc<dyn VisionClient>,
    images: Vec<DynamicImage>,
    kind: PromptKind,
    config: &OcrConfig,
) -> Vec<PageResult> {
    let batch: Vec<GenerationRequest> = images
        .into_iter()
        .map(|image| GenerationRequest::new(image, kind))
        .collect();
    parse_batch(client, batch, config).await
}

/// Convert a single page image. Equivalent to a one-element [`parse_images`].
pub async fn parse_image(
    client: &Arc<dyn VisionClient>,
    image: DynamicImage,
    kind: PromptKind,
    config: &OcrConfig,
) -> PageResult {
    let mut results = parse_images(client, vec![image], kind, config).await;
    // One input produces exactly one result.
    results.remove(0)
}

/// Convert a batch of prepared generation requests (custom prompts allowed).
pub async fn parse_batch(
    client: &Arc<dyn VisionClient>,
    batch: Vec<GenerationRequest>,
    config: &OcrConfig,
) -> Vec<PageResult> {
    info!("Converting {} page(s)", batch.len());

    // Step 1: run all inference items through the orchestrator.
    let generated = generate_batch(client, &batch, config).await;

    // Step 2: assemble structured views per page, in input order.
    generated
        .into_iter()
        .zip(&batch)
        .enumerate()
        .map(|(page_index, (result, request))| {
            assemble_page(page_index, &request.image, result, config)
        })
        .collect()
}

/// Build the structured views of one page from its raw completion.
fn assemble_page(
    page_index: usize,
    image: &DynamicImage,
    result: GenerationResult,
    config: &OcrConfig,
) -> PageResult {
    let (width, height) = (image.width(), image.height());

    if result.failed {
        debug!("Page {page_index}: generation failed, emitting empty views");
        return PageResult {
            page_index,
            width,
            height,
            cells: Vec::new(),
            markdown: String::new(),
            raw: result.raw,
            token_count: result.token_count,
            failed: true,
        };
    }

    let blocks = parse_layout(&result.raw, width, height);
    debug!("Page {page_index}: {} layout block(s)", blocks.len());

    let cells = blocks
        .iter()
        .map(|block| Cell {
            bbox: block.bbox,
            category: block.label.clone(),
            text: extract_cell_text(&block.label, &block.content),
        })
        .collect();

    let markdown = render_markdown(&result.raw, config.include_headers_footers);

    PageResult {
        page_index,
        width,
        height,
        cells,
        markdown,
        raw: result.raw,
        token_count: result.token_count,
        failed: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assemble_carries_page_geometry_and_raw() {
        let image = DynamicImage::new_rgb8(800, 600);
        let result = GenerationResult {
            raw: r#"<div data-bbox="[0,0,1024,512]" data-label="Text">body</div>"#.to_string(),
            token_count: 42,
            failed: false,
        };
        let page = assemble_page(3, &image, result, &OcrConfig::default());

        assert_eq!(page.page_index, 3);
        assert_eq!((page.width, page.height), (800, 600));
        assert_eq!(page.token_count, 42);
        assert_eq!(page.cells.len(), 1);
        assert_eq!(page.cells[0].category, "Text");
        assert_eq!(page.cells[0].bbox, [0, 0, 800, 300]);
        assert_eq!(page.cells[0].text, "body");
        assert_eq!(page.markdown, "body");
        assert!(page.raw.contains("data-bbox"));
    }

    #[test]
    fn failed_generation_yields_empty_views() {
        let image = DynamicImage::new_rgb8(100, 100);
        let page = assemble_page(0, &image, GenerationResult::failure(), &OcrConfig::default());

        assert!(page.failed);
        assert!(page.cells.is_empty());
        assert!(page.markdown.is_empty());
        assert!(page.raw.is_empty());
    }

    #[test]
    fn furniture_excluded_from_markdown_but_kept_as_cells() {
        let raw = concat!(
            r#"<div data-bbox="[0,0,1024,64]" data-label="Page-header">Running head</div>"#,
            r#"<div data-bbox="[0,64,1024,512]" data-label="Text">body text</div>"#,
        );
        let image = DynamicImage::new_rgb8(1024, 1024);
        let result = GenerationResult {
            raw: raw.to_string(),
            token_count: 10,
            failed: false,
        };

        let page = assemble_page(0, &image, result.clone(), &OcrConfig::default());
        assert_eq!(page.cells.len(), 2, "cells keep every region");
        assert!(!page.markdown.contains("Running head"));
        assert!(page.markdown.contains("body text"));

        let keep = OcrConfig::builder()
            .include_headers_footers(true)
            .build()
            .unwrap();
        let page = assemble_page(0, &image, result, &keep);
        assert!(page.markdown.contains("Running head"));
    }

    #[test]
    fn empty_completion_yields_empty_but_successful_page() {
        let image = DynamicImage::new_rgb8(10, 10);
        let result = GenerationResult {
            raw: String::new(),
            token_count: 0,
            failed: false,
        };
        let page = assemble_page(0, &image, result, &OcrConfig::default());
        assert!(!page.failed);
        assert!(page.cells.is_empty());
        assert!(page.markdown.is_empty());
    }
}
