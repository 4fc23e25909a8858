//! Style classification: font attributes → Markdown emphasis.
//!
//! PDF producers disagree about how to say "bold": some set a heavy font
//! weight, some the ForceBold descriptor flag, many only put `Bold` in the
//! font name. Explicit flags win per axis when the library reports them;
//! otherwise the font name decides.

use crate::backend::FontInfo;

/// The four emphasis levels Markdown can express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Emphasis {
    #[default]
    Plain,
    Bold,
    Italic,
    BoldItalic,
}

impl Emphasis {
    pub fn from_parts(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (false, false) => Emphasis::Plain,
            (true, false) => Emphasis::Bold,
            (false, true) => Emphasis::Italic,
            (true, true) => Emphasis::BoldItalic,
        }
    }

    /// Delimiter placed on both sides of the text.
    pub fn marker(self) -> &'static str {
        match self {
            Emphasis::Plain => "",
            Emphasis::Bold => "**",
            Emphasis::Italic => "*",
            Emphasis::BoldItalic => "***",
        }
    }

    /// Wrap `text` in this emphasis, keeping surrounding whitespace outside
    /// the delimiters (`** x**` is not valid emphasis).
    pub fn wrap(self, text: &str) -> String {
        let core = text.trim();
        if self == Emphasis::Plain || core.is_empty() {
            return text.to_string();
        }
        let lead = &text[..text.len() - text.trim_start().len()];
        let trail = &text[text.trim_end().len()..];
        let m = self.marker();
        format!("{lead}{m}{core}{m}{trail}")
    }
}

/// Name fragments that mark a bold face.
const BOLD_HINTS: &[&str] = &["bold", "black", "heavy", "semibold", "demi"];
/// Name fragments that mark a slanted face.
const ITALIC_HINTS: &[&str] = &["italic", "oblique"];

/// Decide the emphasis of a span from its font.
pub fn classify(font: &FontInfo) -> Emphasis {
    let name = font.name.to_lowercase();
    let bold = font
        .flags
        .bold
        .unwrap_or_else(|| BOLD_HINTS.iter().any(|h| name.contains(h)));
    let italic = font
        .flags
        .italic
        .unwrap_or_else(|| ITALIC_HINTS.iter().any(|h| name.contains(h)));
    Emphasis::from_parts(bold, italic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::StyleFlags;

    fn font(name: &str, bold: Option<bool>, italic: Option<bool>) -> FontInfo {
        FontInfo {
            name: name.to_string(),
            flags: StyleFlags { bold, italic },
        }
    }

    #[test]
    fn name_fallback() {
        assert_eq!(classify(&font("Helvetica", None, None)), Emphasis::Plain);
        assert_eq!(classify(&font("Helvetica-Bold", None, None)), Emphasis::Bold);
        assert_eq!(classify(&font("Times-Italic", None, None)), Emphasis::Italic);
        assert_eq!(
            classify(&font("ABCDEF+Helvetica-BoldOblique", None, None)),
            Emphasis::BoldItalic
        );
        assert_eq!(classify(&font("ARIALBLACK", None, None)), Emphasis::Bold);
    }

    #[test]
    fn explicit_flags_take_precedence() {
        // A "Bold" name with an explicit non-bold flag stays plain.
        assert_eq!(
            classify(&font("Foo-Bold", Some(false), None)),
            Emphasis::Plain
        );
        assert_eq!(
            classify(&font("Foo-Regular", Some(true), Some(true))),
            Emphasis::BoldItalic
        );
        // Flags only override their own axis.
        assert_eq!(
            classify(&font("Foo-Italic", Some(true), None)),
            Emphasis::BoldItalic
        );
    }

    #[test]
    fn empty_name_is_plain() {
        assert_eq!(classify(&FontInfo::default()), Emphasis::Plain);
    }

    #[test]
    fn wrap_keeps_whitespace_outside() {
        assert_eq!(Emphasis::Bold.wrap("word"), "**word**");
        assert_eq!(Emphasis::Italic.wrap(" two words "), " *two words* ");
        assert_eq!(Emphasis::BoldItalic.wrap("x"), "***x***");
        assert_eq!(Emphasis::Bold.wrap("   "), "   ");
        assert_eq!(Emphasis::Plain.wrap(" a "), " a ");
    }
}
