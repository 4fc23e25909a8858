//! Markdown emission: classified spans + placed images → Markdown text.
//!
//! Per page, spans are walked in the order the backend reported them.
//! Consecutive spans with the same [`Emphasis`] merge into one run so a bold
//! sentence split over several text objects becomes a single `**…**`.
//! Geometry decides how two neighbouring spans are joined:
//!
//! ```text
//!  same line, touching          → "Hel" + "lo"        = "Hello"
//!  same line, visible gap       → "Hello" + "world"   = "Hello world"
//!  next line, normal leading    → joined with a space
//!  next line, gap > ratio × size → paragraph break (blank line)
//!  jump upwards (new column)    → paragraph break
//! ```
//!
//! Without bounds every join is a space and no paragraph breaks are guessed.
//!
//! Span text is literal: characters Markdown would read as inline markup are
//! backslash-escaped, and so is a block marker (`#`, `>`, `-`, `+`, `1.`)
//! at the start of a paragraph.

use crate::backend::TextSpan;
use crate::config::PageSeparator;
use crate::output::{DocumentMetadata, PageImage};
use crate::pipeline::style::{classify, Emphasis};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::VecDeque;

/// Horizontal gap, as a fraction of the font size, that reads as a space.
const WORD_GAP_RATIO: f32 = 0.15;

/// Paragraph openings that would turn the paragraph into a heading, quote,
/// list item or rule.
static RE_BLOCK_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?P<num>\d{1,9})[.)](?:\s|$)|#{1,6}(?:\s|$)|>|[-+](?:\s|$)|-{3,}\s*$)")
        .unwrap()
});

/// Escape inline markup characters in literal text.
fn escape_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '*' | '_' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Keep a rendered paragraph from being read as a block construct.
fn escape_block_start(paragraph: String) -> String {
    let Some(caps) = RE_BLOCK_MARKER.captures(&paragraph) else {
        return paragraph;
    };
    match caps.name("num") {
        // `12.` → `12\.`
        Some(num) => {
            let at = num.end();
            format!("{}\\{}", &paragraph[..at], &paragraph[at..])
        }
        None => format!("\\{paragraph}"),
    }
}

/// Knobs for [`emit_page`].
#[derive(Debug, Clone, Copy)]
pub struct EmitOptions {
    /// Vertical gap (× font size) above which a new paragraph starts.
    pub paragraph_gap_ratio: f32,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            paragraph_gap_ratio: 0.7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Join {
    Direct,
    Space,
    Paragraph,
}

fn join_between(prev: &TextSpan, next: &TextSpan, opts: &EmitOptions) -> Join {
    let (Some(a), Some(b)) = (prev.bounds, next.bounds) else {
        return Join::Space;
    };
    let mut size = prev.font_size.max(next.font_size);
    if size <= 0.0 {
        size = a.height().max(b.height()).max(1.0);
    }

    if (a.center_y() - b.center_y()).abs() < size * 0.5 {
        return if b.left - a.right > size * WORD_GAP_RATIO || b.left < a.left {
            Join::Space
        } else {
            Join::Direct
        };
    }
    if b.top > a.top + size {
        return Join::Paragraph;
    }
    if a.bottom - b.top > size * opts.paragraph_gap_ratio {
        Join::Paragraph
    } else {
        Join::Space
    }
}

/// A paragraph under construction: emphasis runs in order.
#[derive(Debug, Default)]
struct Paragraph {
    runs: Vec<(Emphasis, String)>,
}

impl Paragraph {
    fn push(&mut self, emphasis: Emphasis, text: &str) {
        let text = escape_inline(&text.replace(['\r', '\n'], " "));
        if text.trim().is_empty() {
            self.push_space();
            return;
        }
        match self.runs.last_mut() {
            Some((last, run)) if *last == emphasis => run.push_str(&text),
            _ => self.runs.push((emphasis, text)),
        }
    }

    fn push_space(&mut self) {
        if let Some((_, run)) = self.runs.last_mut() {
            if !run.ends_with(' ') {
                run.push(' ');
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    fn render(&self) -> String {
        let joined: String = self.runs.iter().map(|(e, t)| e.wrap(t)).collect();
        escape_block_start(joined.split_whitespace().collect::<Vec<_>>().join(" "))
    }
}

/// Markdown reference to an extracted image.
pub fn image_reference(image: &PageImage) -> String {
    format!("![]({})", image.relative_path)
}

/// Emit one page in formatted mode.
///
/// `images` are placed before the first span that starts below their top
/// edge; images without a position, or below all text, go at the end.
pub fn emit_page(spans: &[TextSpan], images: &[PageImage], opts: &EmitOptions) -> String {
    let mut placed: Vec<&PageImage> = images.iter().filter(|i| i.bounds.is_some()).collect();
    placed.sort_by(|a, b| {
        let (ta, tb) = (top_of(a), top_of(b));
        tb.total_cmp(&ta)
    });
    let mut pending: VecDeque<&PageImage> = placed.into();

    let mut blocks: Vec<String> = Vec::new();
    let mut para = Paragraph::default();
    let mut prev: Option<&TextSpan> = None;

    let flush = |para: &mut Paragraph, blocks: &mut Vec<String>| {
        if !para.is_empty() {
            let text = para.render();
            if !text.is_empty() {
                blocks.push(text);
            }
            *para = Paragraph::default();
        }
    };

    for span in spans {
        if let Some(b) = span.bounds {
            while pending.front().is_some_and(|img| top_of(img) >= b.top) {
                if let Some(img) = pending.pop_front() {
                    flush(&mut para, &mut blocks);
                    blocks.push(image_reference(img));
                    prev = None;
                }
            }
        }

        match prev.map(|p| join_between(p, span, opts)) {
            Some(Join::Paragraph) => flush(&mut para, &mut blocks),
            Some(Join::Space) => para.push_space(),
            Some(Join::Direct) | None => {}
        }
        para.push(classify(&span.font), &span.text);
        prev = Some(span);
    }
    flush(&mut para, &mut blocks);

    blocks.extend(pending.into_iter().map(image_reference));
    blocks.extend(
        images
            .iter()
            .filter(|i| i.bounds.is_none())
            .map(image_reference),
    );
    blocks.join("\n\n")
}

fn top_of(image: &PageImage) -> f32 {
    image.bounds.map_or(f32::NEG_INFINITY, |b| b.top)
}

/// Emit one page in simple mode: the raw page text, line endings normalised.
pub fn emit_simple_page(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .trim()
        .to_string()
}

/// Title / author / subject header, or `None` when the document has none.
pub fn metadata_header(meta: &DocumentMetadata) -> Option<String> {
    let mut lines = Vec::new();
    if let Some(ref t) = meta.title {
        lines.push(format!("# {t}"));
    }
    if let Some(ref a) = meta.author {
        lines.push(format!("**Author:** {a}"));
    }
    if let Some(ref s) = meta.subject {
        lines.push(format!("**Subject:** {s}"));
    }
    if lines.is_empty() {
        return None;
    }
    lines.push("---".to_string());
    Some(lines.join("\n\n"))
}

/// Join an optional header and the non-empty pages into one document.
///
/// `pages` holds `(page_number, markdown)` in page order.
pub fn assemble_document(
    header: Option<&str>,
    pages: &[(usize, String)],
    separator: &PageSeparator,
) -> String {
    let mut out = String::new();
    if let Some(h) = header {
        out.push_str(h);
        out.push_str("\n\n");
    }
    for (i, (number, markdown)) in pages.iter().filter(|(_, md)| !md.trim().is_empty()).enumerate() {
        if i > 0 {
            out.push_str(&separator.render(*number));
        }
        out.push_str(markdown);
    }
    out
}
