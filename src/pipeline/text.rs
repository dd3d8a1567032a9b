//! Per-cell typed text extraction.
//!
//! Each layout block gets a text view appropriate to its region type:
//! tables keep their HTML (pipe tables cannot express spans), formulas
//! yield their LaTeX, image regions yield nothing, and everything else
//! reduces to normalized plain text. Dispatch goes through
//! [`BlockKind`] so the mapping stays closed and exhaustive.

use crate::pipeline::layout::BlockKind;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

static MATH_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("math").unwrap());
static RE_SPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());
static RE_PADDED_NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r" ?\n ?").unwrap());
// Tables are sliced out of the source text rather than re-serialised from
// the parse tree, which would insert tbody wrappers the model never wrote.
static RE_TABLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<table\b.*?</table>").unwrap());

/// Extract the text representation appropriate for a cell's label.
///
/// - `Table` → embedded `<table>` HTML, verbatim (plain-text fallback)
/// - `Formula`/`Equation`/`Math` → newline-joined LaTeX (plain-text fallback)
/// - `Image`/`Figure`/`Picture` → empty string
/// - anything else → normalized plain text
pub fn extract_cell_text(label: &str, fragment: &str) -> String {
    let kind = BlockKind::from_label(label);
    if kind.is_visual() {
        return String::new();
    }
    match kind {
        BlockKind::Table => html_to_table_html(fragment),
        BlockKind::Formula => html_to_latex(fragment),
        _ => html_to_plain_text(fragment),
    }
}

/// Extract plain text from a markup fragment.
///
/// `<br>` becomes `\n`, `<math>` elements contribute their LaTeX inline,
/// whitespace runs collapse to single spaces while explicit newlines
/// survive, and the result is trimmed.
pub fn html_to_plain_text(fragment: &str) -> String {
    let doc = Html::parse_fragment(fragment);
    let mut pieces: Vec<String> = Vec::new();
    collect_text(doc.root_element(), &mut pieces);

    let joined = pieces.join(" ");
    let collapsed = RE_SPACE_RUN.replace_all(&joined, " ");
    let restored = RE_PADDED_NEWLINE.replace_all(&collapsed, "\n");
    restored.trim().to_string()
}

fn collect_text(el: ElementRef<'_>, pieces: &mut Vec<String>) {
    for node in el.children() {
        match node.value() {
            Node::Text(text) => {
                let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
                if !normalized.is_empty() {
                    pieces.push(normalized);
                }
            }
            Node::Element(e) => {
                let Some(child) = ElementRef::wrap(node) else {
                    continue;
                };
                match e.name() {
                    "br" => pieces.push("\n".to_string()),
                    "math" => {
                        let latex: String = child.text().collect();
                        let latex = latex.trim();
                        if !latex.is_empty() {
                            pieces.push(latex.to_string());
                        }
                    }
                    _ => collect_text(child, pieces),
                }
            }
            _ => {}
        }
    }
}

/// Extract the `<table>` elements of a fragment as verbatim HTML.
///
/// Multiple tables are joined with a blank line. Falls back to plain text
/// when the fragment holds no table.
pub fn html_to_table_html(fragment: &str) -> String {
    let tables: Vec<&str> = RE_TABLE.find_iter(fragment).map(|m| m.as_str()).collect();
    if tables.is_empty() {
        return html_to_plain_text(fragment);
    }
    tables.join("\n\n")
}

/// Extract LaTeX from a fragment's `<math>` elements, newline-joined.
///
/// Falls back to plain text when the fragment holds no math element.
pub fn html_to_latex(fragment: &str) -> String {
    let doc = Html::parse_fragment(fragment);
    let parts: Vec<String> = doc
        .select(&MATH_SELECTOR)
        .filter_map(|el| {
            let latex: String = el.text().collect();
            let latex = latex.trim();
            (!latex.is_empty()).then(|| latex.to_string())
        })
        .collect();

    if parts.is_empty() {
        return html_to_plain_text(fragment);
    }
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── dispatch ─────────────────────────────────────────────────────────

    #[test]
    fn table_cell_keeps_embedded_table_verbatim() {
        let fragment = "<div><table><tr><td>x</td></tr></table></div>";
        assert_eq!(
            extract_cell_text("Table", fragment),
            "<table><tr><td>x</td></tr></table>"
        );
    }

    #[test]
    fn table_cell_without_table_falls_back_to_text() {
        assert_eq!(
            extract_cell_text("Table", "<p>just a caption</p>"),
            "just a caption"
        );
    }

    #[test]
    fn multiple_tables_joined_by_blank_line() {
        let fragment = "<table><tr><td>a</td></tr></table><p>between</p><table><tr><td>b</td></tr></table>";
        let out = extract_cell_text("Table", fragment);
        assert_eq!(
            out,
            "<table><tr><td>a</td></tr></table>\n\n<table><tr><td>b</td></tr></table>"
        );
    }

    #[test]
    fn image_cells_are_empty() {
        assert_eq!(extract_cell_text("Image", "<div><img src='x'/></div>"), "");
        assert_eq!(extract_cell_text("Figure", "<p>caption text</p>"), "");
        assert_eq!(extract_cell_text("Picture", "<img/>"), "");
    }

    #[test]
    fn formula_cells_yield_latex() {
        let fragment = "<math>E = mc^2</math><math>F = ma</math>";
        assert_eq!(extract_cell_text("Formula", fragment), "E = mc^2\nF = ma");
        assert_eq!(extract_cell_text("Equation", "<math>a+b</math>"), "a+b");
    }

    #[test]
    fn formula_without_math_falls_back_to_text() {
        assert_eq!(extract_cell_text("Formula", "x squared"), "x squared");
    }

    #[test]
    fn other_labels_extract_plain_text() {
        assert_eq!(extract_cell_text("Text", "<p>hello <b>world</b></p>"), "hello world");
        assert_eq!(extract_cell_text("block", "plain"), "plain");
    }

    // ── plain text ───────────────────────────────────────────────────────

    #[test]
    fn br_becomes_newline() {
        assert_eq!(
            html_to_plain_text("<p>line one<br/>line two</p>"),
            "line one\nline two"
        );
    }

    #[test]
    fn math_inlined_as_latex() {
        assert_eq!(
            html_to_plain_text("<p>where <math>x_0</math> is the origin</p>"),
            "where x_0 is the origin"
        );
    }

    #[test]
    fn whitespace_runs_collapse() {
        assert_eq!(
            html_to_plain_text("<p>too   many\t spaces</p>"),
            "too many spaces"
        );
    }

    #[test]
    fn surrounding_whitespace_trimmed() {
        assert_eq!(html_to_plain_text("  <p>  padded  </p>  "), "padded");
    }

    #[test]
    fn nested_elements_flattened_with_spaces() {
        assert_eq!(
            html_to_plain_text("<div><span>a</span><span>b</span></div>"),
            "a b"
        );
    }

    #[test]
    fn empty_fragment_is_empty() {
        assert_eq!(html_to_plain_text(""), "");
    }
}
