//! # vlm2doc
//!
//! Structured document reconstruction from vision-language-model OCR.
//!
//! `vlm2doc` drives a vision-capable model over page images and turns its
//! block-annotated markup into structured pages: layout cells with pixel
//! bounding boxes, per-region typed text, a Markdown rendering, and cropped
//! figure images.
//!
//! ## Pipeline
//!
//! ```text
//!  page images
//!       │
//!       ▼
//!  ┌────────────────┐   concurrent, order-preserving, with
//!  │  orchestrator  │   degeneracy-triggered retries
//!  └────────────────┘
//!       │ raw markup
//!       ▼
//!  ┌────────────────┐   top-level <div data-bbox data-label> regions,
//!  │ layout parser  │   1024-normalized boxes → pixel space
//!  └────────────────┘
//!       │ blocks
//!       ├──────────────► typed cell text (plain / table HTML / LaTeX)
//!       ├──────────────► markdown rendering
//!       └──────────────► cropped figure images
//! ```
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vlm2doc::{parse_images, OcrConfig, OpenAiCompatClient, PromptKind, VisionClient};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client: Arc<dyn VisionClient> = Arc::new(OpenAiCompatClient::new(
//!     "http://localhost:8000",
//!     "EMPTY",
//!     "my-ocr-model",
//! ));
//! let config = OcrConfig::builder().max_workers(4).build()?;
//!
//! let pages = vec![image::open("page-1.png")?, image::open("page-2.png")?];
//! let results = parse_images(&client, pages, PromptKind::Layout, &config).await;
//!
//! for page in &results {
//!     println!("page {}: {} cells", page.page_index, page.cells.len());
//!     println!("{}", page.markdown);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Failure model
//!
//! Two tiers. [`Vlm2DocError`] is for caller mistakes (invalid
//! configuration) and is returned eagerly. [`ClientError`] covers the
//! inference transport; the orchestrator absorbs it per item, retries, and
//! surfaces unrecoverable failures as `failed = true` on the affected
//! [`PageResult`] so one bad page never sinks a batch.

pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;

pub use client::{CompletionRequest, CompletionResponse, OpenAiCompatClient, VisionClient};
pub use config::{OcrConfig, OcrConfigBuilder};
pub use convert::{parse_batch, parse_image, parse_images};
pub use error::{ClientError, Vlm2DocError};
pub use output::{Cell, ExtractedImage, GenerationResult, PageResult};
pub use pipeline::generate::{generate_batch, GenerationRequest};
pub use pipeline::images::{extract_images, image_name};
pub use pipeline::layout::{parse_layout, BlockKind, LayoutBlock};
pub use pipeline::render::{filter_html, render_markdown};
pub use pipeline::repeat::is_degenerate;
pub use pipeline::text::extract_cell_text;
pub use prompts::PromptKind;
