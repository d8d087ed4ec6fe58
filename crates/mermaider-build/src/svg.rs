//! SVG post-processing.
//!
//! - [`normalize`] trims a rendered document to its `<svg>` root element
//! - [`fix_width`] replaces the percentage width Mermaid emits with an
//!   absolute one and prepends an XML declaration, so the file can be used as
//!   a standalone image

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::consts::{MIN_FIXED_WIDTH, XML_DECLARATION};

/// Regex to match the root `<svg ...>` start tag.
static SVG_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^<svg\b[^>]*>").unwrap());

/// Regex to capture the width component of a `viewBox` attribute.
static VIEWBOX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\sviewbox="\s*-?[\d.]+[\s,]+-?[\d.]+[\s,]+([\d.]+)[\s,]+[\d.]+\s*""#)
        .unwrap()
});

/// Regex to match a `width` attribute with any value.
static WIDTH_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\s)width="[^"]*""#).unwrap());

/// Regex to match a numeric `width` attribute (e.g., `width="136"`, `width="136px"`).
static WIDTH_NUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\swidth="([\d.]+)(?:px)?""#).unwrap());

/// Regex to match `max-width` in a style attribute (e.g., `max-width: 250px;`).
static STYLE_MAX_WIDTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"max-width:\s*[^;"]*;?\s*"#).unwrap());

/// Trim rendered output to the span from `<svg` to the final `</svg>`.
///
/// Drops XML prologs, doctypes, comments and whitespace around the root
/// element. Returns `None` when the output contains no SVG document.
#[must_use]
pub fn normalize(svg: &str) -> Option<&str> {
    const CLOSE: &str = "</svg>";

    let start = svg.find("<svg")?;
    let end = svg.rfind(CLOSE)? + CLOSE.len();
    (start < end).then(|| &svg[start..end])
}

/// Give a normalized SVG an explicit width and an XML declaration.
///
/// The width comes from the `viewBox` (or an existing numeric `width`) and is
/// clamped to at least [`MIN_FIXED_WIDTH`] so degenerate renders stay visible.
/// `max-width` styles on the root element are removed since they only apply
/// to percentage widths.
#[must_use]
pub fn fix_width(svg: &str) -> String {
    let Some(tag) = SVG_TAG_RE.find(svg) else {
        return format!("{XML_DECLARATION}\n{svg}");
    };

    let width = root_width(tag.as_str()).max(MIN_FIXED_WIDTH);
    let width_attr = format!(r#"width="{width}px""#);

    let root = STYLE_MAX_WIDTH_RE.replace_all(tag.as_str(), "");
    let root = if WIDTH_ATTR_RE.is_match(&root) {
        WIDTH_ATTR_RE
            .replace(&root, |caps: &Captures| format!("{}{width_attr}", &caps[1]))
            .into_owned()
    } else {
        root.replacen("<svg", &format!("<svg {width_attr}"), 1)
    };

    format!("{XML_DECLARATION}\n{root}{}", &svg[tag.end()..])
}

/// Intrinsic width of a root element, or `0.0` when it has none.
fn root_width(tag: &str) -> f64 {
    VIEWBOX_RE
        .captures(tag)
        .or_else(|| WIDTH_NUM_RE.captures(tag))
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(0.0)
}
