//! Rendered views: filtered HTML and Markdown.
//!
//! Both views derive from the same block-annotated markup. Filtering
//! happens first — page furniture is dropped, image regions are replaced
//! with a bracketed placeholder — and the Markdown conversion then walks
//! the filtered tree with a fixed rule set:
//!
//! - ATX headings, `-` bullets
//! - tables embedded as raw HTML (table semantics are lossy in Markdown)
//! - `<math>` → `$…$` inline, or newline-wrapped `$$…$$` when
//!   `display="block"`
//! - literal `$`, `_`, `*` escaped in plain text so page content cannot
//!   collide with Markdown/LaTeX syntax; link text additionally escapes
//!   `[ ] ( )`
//! - whitespace runs collapse to a single space, except inside
//!   pre/code/math contexts, which pass through unescaped
//!
//! The conversion is total: it never panics or errors, and markup with no
//! renderable content yields an empty string rather than failing the page.

use crate::pipeline::layout::BlockKind;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node};

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static RE_LINK_BRACKETS: Lazy<Regex> = Lazy::new(|| Regex::new(r"([\[\]()])").unwrap());
static RE_PADDED_BLANK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]+\n").unwrap());
static RE_EXCESS_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Re-serialize only the top-level blocks of the markup.
///
/// `Page-Header`/`Page-Footer` blocks are dropped unless
/// `include_headers_footers` is set. `Image`/`Figure` blocks have their
/// inner content replaced with a bracketed placeholder (`[Image]`,
/// `[Figure]`) since embedded raster content is not representable as text.
/// The output is the concatenated inner markup of the surviving blocks.
pub fn filter_html(markup: &str, include_headers_footers: bool) -> String {
    let doc = Html::parse_fragment(markup);
    let mut out = String::new();

    for node in doc.root_element().children() {
        let Some(el) = ElementRef::wrap(node) else {
            continue;
        };
        if el.value().name() != "div" {
            continue;
        }

        if let Some(label) = el.value().attr("data-label") {
            let kind = BlockKind::from_label(label);
            if kind.is_furniture() && !include_headers_footers {
                continue;
            }
            if matches!(kind, BlockKind::Image | BlockKind::Figure) {
                out.push('[');
                out.push_str(label);
                out.push(']');
                continue;
            }
        }
        out.push_str(&el.inner_html());
    }

    out
}

/// Render the markup as Markdown.
///
/// Applies [`filter_html`] first, then converts the filtered tree with the
/// fixed rules described in the module docs.
pub fn render_markdown(markup: &str, include_headers_footers: bool) -> String {
    let filtered = filter_html(markup, include_headers_footers);
    if filtered.trim().is_empty() {
        return String::new();
    }

    let doc = Html::parse_fragment(&filtered);
    tidy(&convert_children(doc.root_element(), false))
}

// ── Tree walking ─────────────────────────────────────────────────────────

fn convert_children(el: ElementRef<'_>, preserve: bool) -> String {
    let mut out = String::new();
    for node in el.children() {
        match node.value() {
            Node::Text(text) => out.push_str(&process_text(text, preserve)),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(node) {
                    out.push_str(&convert_element(child, preserve));
                }
            }
            _ => {}
        }
    }
    out
}

fn convert_element(el: ElementRef<'_>, preserve: bool) -> String {
    let name = el.value().name();
    match name {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = name[1..].parse::<usize>().unwrap_or(1);
            let text = convert_children(el, false);
            format!("\n\n{} {}\n\n", "#".repeat(level), text.trim())
        }
        "p" => format!("\n\n{}\n\n", convert_children(el, preserve).trim()),
        "br" => "\n".to_string(),
        "hr" => "\n\n---\n\n".to_string(),
        "strong" | "b" => wrap_inline(&convert_children(el, preserve), "**"),
        "em" | "i" => wrap_inline(&convert_children(el, preserve), "*"),
        // Markdown has no sub/superscript syntax; keep the HTML inline.
        "sub" => format!("<sub>{}</sub>", convert_children(el, preserve).trim()),
        "sup" => format!("<sup>{}</sup>", convert_children(el, preserve).trim()),
        "code" | "kbd" | "samp" => format!("`{}`", convert_children(el, true)),
        "pre" => {
            let text: String = el.text().collect();
            format!("\n\n```\n{}\n```\n\n", text.trim_end())
        }
        "table" => format!("\n\n{}\n\n", el.html()),
        "math" => convert_math(el),
        "a" => convert_link(el, preserve),
        "img" => convert_img(el),
        "ul" => convert_list(el, false),
        "ol" => convert_list(el, true),
        "blockquote" => {
            let inner = convert_children(el, preserve);
            let quoted: String = inner
                .trim()
                .lines()
                .map(|l| format!("> {l}\n"))
                .collect();
            format!("\n\n{quoted}\n")
        }
        // div, span, section and anything unrecognised pass their children
        // through.
        _ => convert_children(el, preserve),
    }
}

fn wrap_inline(text: &str, marker: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    format!("{marker}{trimmed}{marker}")
}

fn convert_math(el: ElementRef<'_>) -> String {
    let tex: String = el.text().collect();
    let tex = tex.trim();
    let block = el.value().attr("display") == Some("block");
    if block {
        format!("\n$${tex}$$\n")
    } else {
        format!(" ${tex}$ ")
    }
}

fn convert_link(el: ElementRef<'_>, preserve: bool) -> String {
    let text = convert_children(el, preserve);
    let text = RE_LINK_BRACKETS.replace_all(text.trim(), r"\$1");
    match el.value().attr("href") {
        Some(href) if !href.is_empty() => format!("[{text}]({href})"),
        _ => text.into_owned(),
    }
}

fn convert_img(el: ElementRef<'_>) -> String {
    let alt = el.value().attr("alt").unwrap_or("");
    let src = el.value().attr("src").unwrap_or("");
    if src.is_empty() {
        return String::new();
    }
    format!("![{alt}]({src})")
}

fn convert_list(el: ElementRef<'_>, ordered: bool) -> String {
    let mut out = String::from("\n\n");
    let mut index = 0usize;

    for node in el.children() {
        let Some(item) = ElementRef::wrap(node) else {
            continue;
        };
        if item.value().name() != "li" {
            continue;
        }
        index += 1;

        let marker = if ordered {
            format!("{index}. ")
        } else {
            "- ".to_string()
        };
        let body = convert_children(item, false);
        let body = body.trim();

        let mut lines = body.lines();
        out.push_str(&marker);
        out.push_str(lines.next().unwrap_or(""));
        out.push('\n');
        // Continuation lines (nested lists, wrapped content) stay attached
        // to their item.
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            out.push('\t');
            out.push_str(line);
            out.push('\n');
        }
    }

    out.push('\n');
    out
}

// ── Text handling ────────────────────────────────────────────────────────

/// Collapse and escape one text node.
///
/// In preserve contexts (pre/code/math) the text passes through untouched.
fn process_text(text: &str, preserve: bool) -> String {
    if preserve {
        return text.to_string();
    }
    let collapsed = RE_WHITESPACE.replace_all(text, " ");
    escape_markdown(&collapsed)
}

/// Escape the characters that would otherwise collide with Markdown or
/// LaTeX syntax in plain text.
fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '$' => out.push_str(r"\$"),
            '_' => out.push_str(r"\_"),
            '*' => out.push_str(r"\*"),
            _ => out.push(c),
        }
    }
    out
}

/// Final whitespace normalisation over the assembled document.
fn tidy(out: &str) -> String {
    let no_padded = RE_PADDED_BLANK.replace_all(out, "\n\n");
    let collapsed = RE_EXCESS_NEWLINES.replace_all(&no_padded, "\n\n");
    collapsed.trim().to_string()
}
