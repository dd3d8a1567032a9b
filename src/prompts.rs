//! Built-in prompts for the OCR model.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — the markup contract the layout parser
//!    relies on (`data-bbox` in 1024-space, `data-label`) is stated in
//!    exactly one place.
//!
//! 2. **Testability** — unit tests can inspect prompts directly without a
//!    live model.
//!
//! Callers can bypass the catalogue entirely by attaching a custom prompt to
//! a [`crate::pipeline::generate::GenerationRequest`].

use serde::{Deserialize, Serialize};

/// Which built-in prompt a generation request uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PromptKind {
    /// Block-annotated layout OCR: the default, and the only mode whose
    /// output the layout parser can consume.
    #[default]
    Layout,
    /// Plain transcription without layout annotations.
    Plain,
}

impl PromptKind {
    /// The prompt text sent to the model for this kind.
    pub fn prompt(self) -> &'static str {
        match self {
            PromptKind::Layout => LAYOUT_PROMPT,
            PromptKind::Plain => PLAIN_PROMPT,
        }
    }
}

/// Prompt for block-annotated layout OCR.
///
/// The output contract matters more than the wording: one top-level `<div>`
/// per region, `data-bbox` as a JSON 4-tuple in a 1024×1024 normalized
/// space, `data-label` naming the region type.
pub const LAYOUT_PROMPT: &str = r#"OCR this page into HTML, one top-level <div> per layout region, in reading order.

Each <div> must carry:
- data-bbox: the region bounding box as [x0, y0, x1, y1] on a 1024x1024 grid
- data-label: the region type (Text, Title, Section-header, List-item, Table, Formula, Image, Figure, Caption, Footnote, Page-Header, Page-Footer)

Inside each region:
- Transcribe all text exactly, preserving reading order
- Tables as <table> markup
- Mathematics as <math> elements containing LaTeX; use display="block" for display equations
- Line breaks that carry meaning as <br>

Output only the HTML. Do not add commentary."#;

/// Prompt for plain transcription.
pub const PLAIN_PROMPT: &str = r#"Transcribe all text on this page in reading order.

- Preserve paragraph breaks
- Tables as <table> markup
- Mathematics as <math> elements containing LaTeX

Output only the transcription. Do not add commentary."#;
