//! Pipeline stages for OCR document reconstruction.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations without touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! images ──▶ generate ──▶ layout ──▶ render / text / images
//! (pages)    (VLM+retry)  (blocks)   (markdown, cells, crops)
//! ```
//!
//! 1. [`encode`]   — bound page images into the model's pixel budget and
//!    base64-wrap them for the request body
//! 2. [`generate`] — drive concurrent inference with degeneracy-triggered
//!    retries; the only stage with network I/O
//! 3. [`repeat`]   — the repetition heuristic behind the retry decision
//! 4. [`layout`]   — parse top-level block markup into pixel-space blocks
//! 5. [`render`]   — filtered HTML and Markdown views
//! 6. [`text`]     — per-cell typed text extraction
//! 7. [`images`]   — crop figure regions out of the source page
//!
//! Stages 3–7 are pure and stateless; they are safe to invoke concurrently
//! across distinct pages without any locking discipline.

pub mod encode;
pub mod generate;
pub mod images;
pub mod layout;
pub mod render;
pub mod repeat;
pub mod text;
