//! Configuration types for PDF-to-Markdown conversion.
//!
//! Per-document behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Watch mode adds [`WatchOptions`] on
//! top. Logging verbosity travels inside the config as [`Verbosity`] instead
//! of being read from a global, so every component sees the same setting the
//! caller chose.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for converting one document.
///
/// # Example
/// ```rust
/// use pdftomarkd::{ConversionConfig, ConversionMode};
///
/// let config = ConversionConfig::builder()
///     .mode(ConversionMode::Simple)
///     .min_image_dimension(64)
///     .build()
///     .unwrap();
/// assert!(config.mode.is_simple());
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Formatted (emphasis + images) or simple (raw text). Default: Formatted.
    pub mode: ConversionMode,

    /// Page separator in assembled output. Default: blank line.
    pub page_separator: PageSeparator,

    /// Emit a `# title` / `**Author:**` / `**Subject:**` header followed by
    /// `---` when the document carries that metadata. Default: true.
    pub include_metadata: bool,

    /// Images narrower or shorter than this many pixels are treated as
    /// decorative noise (rules, bullets, icons) and skipped. Default: 32.
    pub min_image_dimension: u32,

    /// Name of the image folder created next to the Markdown file. Default: `images`.
    pub image_dir_name: String,

    /// Vertical gap between two lines, as a multiple of the font size, above
    /// which a paragraph break is emitted. Default: 0.7.
    pub paragraph_gap_ratio: f32,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// How chatty per-file reporting is. Default: Normal.
    pub verbosity: Verbosity,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            mode: ConversionMode::default(),
            page_separator: PageSeparator::default(),
            include_metadata: true,
            min_image_dimension: 32,
            image_dir_name: "images".to_string(),
            paragraph_gap_ratio: 0.7,
            password: None,
            verbosity: Verbosity::default(),
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("mode", &self.mode)
            .field("page_separator", &self.page_separator)
            .field("include_metadata", &self.include_metadata)
            .field("min_image_dimension", &self.min_image_dimension)
            .field("image_dir_name", &self.image_dir_name)
            .field("paragraph_gap_ratio", &self.paragraph_gap_ratio)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("verbosity", &self.verbosity)
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn mode(mut self, mode: ConversionMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn page_separator(mut self, sep: PageSeparator) -> Self {
        self.config.page_separator = sep;
        self
    }

    pub fn include_metadata(mut self, v: bool) -> Self {
        self.config.include_metadata = v;
        self
    }

    pub fn min_image_dimension(mut self, px: u32) -> Self {
        self.config.min_image_dimension = px;
        self
    }

    pub fn image_dir_name(mut self, name: impl Into<String>) -> Self {
        self.config.image_dir_name = name.into();
        self
    }

    pub fn paragraph_gap_ratio(mut self, ratio: f32) -> Self {
        self.config.paragraph_gap_ratio = ratio.clamp(0.1, 10.0);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn verbosity(mut self, v: Verbosity) -> Self {
        self.config.verbosity = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        let name = self.config.image_dir_name.trim();
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(ConvertError::InvalidConfig(format!(
                "image folder must be a plain directory name, got '{}'",
                self.config.image_dir_name
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which conversion path to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionMode {
    /// Emphasis markup, paragraph heuristics and image extraction. (default)
    #[default]
    Formatted,
    /// Raw page text only; no style classification, no images.
    Simple,
}

impl ConversionMode {
    pub fn is_simple(self) -> bool {
        self == ConversionMode::Simple
    }
}

/// Reporting level chosen by `-q` / `-v`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Per-file outcome lines. (default)
    #[default]
    Normal,
    /// Per-file and per-page detail.
    Verbose,
}

impl Verbosity {
    /// Pick the level from the two CLI flags; `quiet` wins.
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => Verbosity::Quiet,
            (false, true) => Verbosity::Verbose,
            (false, false) => Verbosity::Normal,
        }
    }

    /// Default `tracing` filter directive for this level.
    pub fn filter_directive(self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "info",
            Verbosity::Verbose => "debug",
        }
    }
}

/// How to separate pages in the assembled Markdown output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSeparator {
    /// Blank line between pages. (default)
    #[default]
    None,
    /// Horizontal rule: "\n\n---\n\n"
    HorizontalRule,
    /// HTML comment with page number: "<!-- page N -->"
    Comment,
    /// Custom string inserted between pages.
    Custom(String),
}

impl PageSeparator {
    /// Render the separator placed before page `page_num` (1-indexed).
    pub fn render(&self, page_num: usize) -> String {
        match self {
            PageSeparator::None => "\n\n".to_string(),
            PageSeparator::HorizontalRule => "\n\n---\n\n".to_string(),
            PageSeparator::Comment => format!("\n\n<!-- page {page_num} -->\n\n"),
            PageSeparator::Custom(s) => format!("\n\n{s}\n\n"),
        }
    }

    /// Parse the `--separator` CLI value.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => PageSeparator::None,
            "hr" | "---" => PageSeparator::HorizontalRule,
            "comment" => PageSeparator::Comment,
            _ => PageSeparator::Custom(s.trim().to_string()),
        }
    }
}

/// Settings specific to the folder-watch loop.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Where converted Markdown goes. `None` means `<watched>/converted`.
    pub output_dir: Option<PathBuf>,

    /// Wait applied between noticing a file and opening it, so a copy in
    /// progress has a chance to finish. Default: 1 s.
    pub settle_delay: Duration,

    /// Capacity of the bounded event queue between the notifier and the loop.
    /// Default: 64.
    pub queue_capacity: usize,

    /// Convert PDFs already in the folder (whose Markdown is missing) before
    /// waiting for new ones. Default: true.
    pub process_existing: bool,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            output_dir: None,
            settle_delay: Duration::from_millis(1000),
            queue_capacity: 64,
            process_existing: true,
        }
    }
}

impl WatchOptions {
    /// Output directory used for a given watched folder.
    pub fn resolve_output_dir(&self, watched: &std::path::Path) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| watched.join("converted"))
    }
}
