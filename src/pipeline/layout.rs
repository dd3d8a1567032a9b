//! Layout parsing: block-annotated markup → pixel-space layout blocks.
//!
//! The model reports one `<div>` per layout region at the top level of its
//! output, carrying a `data-bbox` attribute (JSON 4-tuple in a fixed
//! 1024×1024 normalized space) and a `data-label` region type. Only those
//! top-level elements are parsed here; whatever nesting lives inside a
//! block is preserved verbatim as `content` for the renderers.
//!
//! Failure policy: one malformed block must never fail the entire page. A
//! missing or unparseable `data-bbox` falls back to a degenerate default
//! box instead of aborting.

use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};

/// Side length of the normalized coordinate space the model reports
/// bounding boxes in.
pub const NORMALIZED_EXTENT: f64 = 1024.0;

/// Fallback bbox (normalized space) for blocks whose `data-bbox` is missing
/// or does not parse as a JSON 4-tuple.
const DEFAULT_BBOX: [f64; 4] = [0.0, 0.0, 1.0, 1.0];

/// One top-level labeled region of a page.
///
/// `bbox` is in pixel coordinates, already rescaled from the normalized
/// space and clamped into the page image. Ordering across a page's blocks
/// preserves the reading order the model emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutBlock {
    /// Pixel bounding box `[x0, y0, x1, y1]` with
    /// `0 ≤ x0 ≤ x1 ≤ width` and `0 ≤ y0 ≤ y1 ≤ height`.
    pub bbox: [u32; 4],
    /// Region type as emitted by the model; `"block"` when absent.
    pub label: String,
    /// Raw inner markup of the block, not re-parsed here.
    pub content: String,
}

impl LayoutBlock {
    /// The closed region-type classification for this block's label.
    pub fn kind(&self) -> BlockKind {
        BlockKind::from_label(&self.label)
    }
}

/// Closed classification of the region labels the renderers dispatch on.
///
/// The model emits free-form label strings; collapsing them into a closed
/// enum with an explicit [`BlockKind::Other`] arm keeps every dispatch site
/// exhaustive and compiler-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Text,
    Title,
    SectionHeader,
    ListItem,
    Caption,
    Footnote,
    Table,
    Formula,
    Image,
    Figure,
    Picture,
    PageHeader,
    PageFooter,
    Other,
}

impl BlockKind {
    pub fn from_label(label: &str) -> Self {
        match label {
            "Text" => Self::Text,
            "Title" => Self::Title,
            "Section-header" | "Section-Header" => Self::SectionHeader,
            "List-item" | "List-Item" => Self::ListItem,
            "Caption" => Self::Caption,
            "Footnote" => Self::Footnote,
            "Table" => Self::Table,
            "Formula" | "Equation" | "Math" => Self::Formula,
            "Image" => Self::Image,
            "Figure" => Self::Figure,
            "Picture" => Self::Picture,
            "Page-Header" | "Page-header" => Self::PageHeader,
            "Page-Footer" | "Page-footer" => Self::PageFooter,
            _ => Self::Other,
        }
    }

    /// Image-like regions whose content is non-textual.
    pub fn is_visual(self) -> bool {
        matches!(self, Self::Image | Self::Figure | Self::Picture)
    }

    /// Running page furniture dropped from rendered views by default.
    pub fn is_furniture(self) -> bool {
        matches!(self, Self::PageHeader | Self::PageFooter)
    }
}

/// Parse block-annotated markup into ordered layout blocks.
///
/// `width`/`height` are the source page image dimensions; normalized bbox
/// coordinates are linearly rescaled into them before storage.
pub fn parse_layout(markup: &str, width: u32, height: u32) -> Vec<LayoutBlock> {
    let doc = Html::parse_fragment(markup);
    let mut blocks = Vec::new();

    for node in doc.root_element().children() {
        let Some(el) = ElementRef::wrap(node) else {
            continue;
        };
        if el.value().name() != "div" {
            continue;
        }

        let normalized = el
            .value()
            .attr("data-bbox")
            .and_then(|raw| serde_json::from_str::<[f64; 4]>(raw).ok())
            .unwrap_or(DEFAULT_BBOX);

        blocks.push(LayoutBlock {
            bbox: rescale_bbox(normalized, width, height),
            label: el.value().attr("data-label").unwrap_or("block").to_string(),
            content: el.inner_html(),
        });
    }

    blocks
}

/// Rescale a normalized-space bbox into pixel coordinates and clamp it into
/// the image, keeping `x0 ≤ x1` and `y0 ≤ y1` even for out-of-range input.
fn rescale_bbox(b: [f64; 4], width: u32, height: u32) -> [u32; 4] {
    let (w, h) = (f64::from(width), f64::from(height));
    let sx = w / NORMALIZED_EXTENT;
    let sy = h / NORMALIZED_EXTENT;

    let x0 = (b[0] * sx).trunc().clamp(0.0, w);
    let y0 = (b[1] * sy).trunc().clamp(0.0, h);
    let x1 = (b[2] * sx).trunc().clamp(x0, w);
    let y1 = (b[3] * sy).trunc().clamp(y0, h);

    [x0 as u32, y0 as u32, x1 as u32, y1 as u32]
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = concat!(
        r#"<div data-bbox="[0, 0, 512, 128]" data-label="Title">A Title</div>"#,
        r#"<div data-bbox="[0, 128, 1024, 512]" data-label="Text">Body <b>text</b></div>"#,
        r#"<div data-bbox="[256, 512, 768, 1024]" data-label="Figure"><img src="x"/></div>"#,
    );

    #[test]
    fn parses_top_level_blocks_in_order() {
        let blocks = parse_layout(PAGE, 1024, 1024);
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].label, "Title");
        assert_eq!(blocks[1].label, "Text");
        assert_eq!(blocks[2].label, "Figure");
    }

    #[test]
    fn bbox_rescaled_to_image_dimensions() {
        let blocks = parse_layout(PAGE, 2048, 512);
        assert_eq!(blocks[0].bbox, [0, 0, 1024, 64]);
        assert_eq!(blocks[2].bbox, [512, 256, 1536, 512]);
    }

    #[test]
    fn rescaling_is_linear_in_width() {
        let narrow = parse_layout(PAGE, 1000, 1000);
        let wide = parse_layout(PAGE, 2000, 1000);
        for (a, b) in narrow.iter().zip(&wide) {
            assert_eq!(b.bbox[0], a.bbox[0] * 2);
            assert_eq!(b.bbox[2], a.bbox[2] * 2);
            assert_eq!(b.bbox[1], a.bbox[1]);
            assert_eq!(b.bbox[3], a.bbox[3]);
        }
    }

    #[test]
    fn bbox_invariants_hold_for_out_of_range_coordinates() {
        let markup = r#"<div data-bbox="[-50, 900, 2000, 1400]">x</div>"#;
        let blocks = parse_layout(markup, 800, 600);
        let [x0, y0, x1, y1] = blocks[0].bbox;
        assert!(x0 <= x1 && x1 <= 800);
        assert!(y0 <= y1 && y1 <= 600);
    }

    #[test]
    fn missing_bbox_falls_back_to_default() {
        let markup = r#"<div data-label="Text">no box</div>"#;
        let blocks = parse_layout(markup, 1024, 1024);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].bbox, [0, 0, 1, 1]);
    }

    #[test]
    fn malformed_bbox_falls_back_without_failing_page() {
        let markup = concat!(
            r#"<div data-bbox="[1, 2, 3]" data-label="Text">bad</div>"#,
            r#"<div data-bbox="not json" data-label="Text">worse</div>"#,
            r#"<div data-bbox="[0, 0, 1024, 1024]" data-label="Text">good</div>"#,
        );
        let blocks = parse_layout(markup, 1024, 1024);
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].bbox, [0, 0, 1, 1]);
        assert_eq!(blocks[1].bbox, [0, 0, 1, 1]);
        assert_eq!(blocks[2].bbox, [0, 0, 1024, 1024]);
    }

    #[test]
    fn missing_label_defaults_to_block() {
        let markup = r#"<div data-bbox="[0,0,10,10]">anon</div>"#;
        let blocks = parse_layout(markup, 1024, 1024);
        assert_eq!(blocks[0].label, "block");
        assert_eq!(blocks[0].kind(), BlockKind::Other);
    }

    #[test]
    fn nested_divs_are_content_not_blocks() {
        let markup = r#"<div data-bbox="[0,0,100,100]" data-label="Text"><div>inner</div></div>"#;
        let blocks = parse_layout(markup, 1024, 1024);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].content.contains("<div>inner</div>"));
    }

    #[test]
    fn non_div_top_level_nodes_ignored() {
        let markup = r#"text outside<p>a paragraph</p><div data-bbox="[0,0,8,8]">in</div>"#;
        let blocks = parse_layout(markup, 1024, 1024);
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn label_classification() {
        assert_eq!(BlockKind::from_label("Table"), BlockKind::Table);
        assert_eq!(BlockKind::from_label("Equation"), BlockKind::Formula);
        assert_eq!(BlockKind::from_label("Picture"), BlockKind::Picture);
        assert_eq!(BlockKind::from_label("Page-Header"), BlockKind::PageHeader);
        assert_eq!(BlockKind::from_label("Unknown-Thing"), BlockKind::Other);
        assert!(BlockKind::Figure.is_visual());
        assert!(BlockKind::PageFooter.is_furniture());
        assert!(!BlockKind::Text.is_visual());
    }
}
