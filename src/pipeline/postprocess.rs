//! Post-processing: deterministic cleanup of assembled Markdown.
//!
//! The emitter produces structurally correct Markdown, but the text inside
//! comes straight from the PDF: CRLF line ends from pdfium's text API,
//! trailing blanks from justified lines, zero-width characters and soft
//! hyphens left in by typesetters. [`clean_markdown`] removes that noise
//! without touching content, so the same PDF always yields the same bytes.
//!
//! Invisible characters go before blank-line collapsing: a line holding only
//! a zero-width space is blank.

use once_cell::sync::Lazy;
use regex::Regex;

/// Zero-width space / non-joiner / joiner, word joiner, BOM, soft hyphen.
static RE_INVISIBLE: Lazy<Regex> =
    Lazy::new(|| Regex::new("[\u{200B}-\u{200D}\u{2060}\u{FEFF}\u{00AD}]").unwrap());

/// Any line ending pdfium or the separator may have produced.
static RE_LINE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r\n?").unwrap());

/// Clean an assembled document.
///
/// * CRLF and lone CR become LF
/// * invisible Unicode is removed
/// * trailing whitespace is trimmed from every line
/// * leading blank lines are dropped and runs of blank lines become one
/// * the result ends with exactly one newline (`"\n"` for an empty document)
pub fn clean_markdown(input: &str) -> String {
    let unified = RE_LINE_END.replace_all(input, "\n");
    let visible = RE_INVISIBLE.replace_all(&unified, "");

    let mut out = String::with_capacity(visible.len() + 1);
    let mut pending_blank = false;
    for line in visible.split('\n').map(str::trim_end) {
        if line.is_empty() {
            pending_blank = !out.is_empty();
            continue;
        }
        if pending_blank {
            out.push('\n');
            pending_blank = false;
        }
        out.push_str(line);
        out.push('\n');
    }

    if out.is_empty() {
        out.push('\n');
    }
    out
}
