//! Text normalization for extracted documents.
//!
//! PDF text comes back with hard line wraps, hyphenated words split across lines and
//! stray page numbers. Plain-text uploads never pass through here.

use once_cell::sync::Lazy;
use regex::Regex;

static HYPHEN_WRAP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)-[ \t]*\r?\n[ \t]*(\w+)").expect("valid regex"));

static PAGE_MARKER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:\d+|(?i:page)\s+\d+\s+(?i:of)\s+\d+)\s*$").expect("valid regex")
});

/// Collapses every run of whitespace into a single space and trims the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Rejoins words that were hyphen-split across a line break: `develop-\nment` → `development`.
pub fn rejoin_hyphenated(text: &str) -> String {
    HYPHEN_WRAP.replace_all(text, "${1}${2}").into_owned()
}

/// Drops lines that contain nothing but a page number or a `Page N of M` marker.
pub fn strip_page_markers(text: &str) -> String {
    text.lines()
        .filter(|line| !PAGE_MARKER_LINE.is_match(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Normalizes PDF pages into a single document.
///
/// Per page: hyphen wraps rejoined, page-marker lines removed, whitespace collapsed.
/// Non-empty pages are then joined with a paragraph break.
pub fn normalize_pdf_pages<S: AsRef<str>>(pages: &[S]) -> String {
    let joined = pages
        .iter()
        .map(|page| collapse_whitespace(&strip_page_markers(&rejoin_hyphenated(page.as_ref()))))
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    // A page that was only "3" collapses to a lone marker paragraph.
    strip_page_markers(&joined)
        .split("\n\n")
        .filter(|para| !para.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
