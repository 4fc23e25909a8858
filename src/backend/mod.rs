//! The seam between pdftomarkd and the PDF library.
//!
//! Everything the converter knows about a PDF arrives through two traits:
//! [`PdfBackend`] opens a file and [`DocumentSource`] hands out its pages one
//! at a time. Pages are plain owned data ([`PageContent`]), so the rest of the
//! pipeline never sees a pdfium type and tests can drive the converter with an
//! in-memory fake.
//!
//! A document's pages form a lazy, finite, non-restartable sequence: wrap a
//! source in [`Pages`] and iterate it once.

pub mod pdfium;

use crate::config::ConversionMode;
use crate::error::ConvertError;
use crate::output::DocumentMetadata;
use image::DynamicImage;
use std::path::Path;

pub use self::pdfium::PdfiumBackend;

/// Axis-aligned box in PDF page coordinates (points, y grows upwards).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Bounds {
    pub fn new(left: f32, bottom: f32, right: f32, top: f32) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    pub fn height(&self) -> f32 {
        (self.top - self.bottom).abs()
    }

    pub fn center_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }
}

/// Style signals reported by the PDF library.
///
/// `None` means the library gave no usable answer for that axis; the
/// classifier then falls back to the font name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StyleFlags {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
}

/// Font attributes of one span.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontInfo {
    /// PostScript / base font name, e.g. `ABCDEF+Helvetica-BoldOblique`.
    pub name: String,
    pub flags: StyleFlags,
}

/// A run of characters sharing one font on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub font: FontInfo,
    /// Font size in points.
    pub font_size: f32,
    /// Position on the page; `None` when the library could not report it.
    pub bounds: Option<Bounds>,
}

impl TextSpan {
    /// A span with a plain font name and no position, mostly for tests.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font: FontInfo::default(),
            font_size: 12.0,
            bounds: None,
        }
    }

    pub fn with_font(mut self, name: impl Into<String>) -> Self {
        self.font.name = name.into();
        self
    }

    pub fn with_flags(mut self, flags: StyleFlags) -> Self {
        self.font.flags = flags;
        self
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.font_size = size;
        self
    }
}

/// One image object found on a page.
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    /// Decoded raster, or the library's reason for not decoding it.
    pub decoded: Result<DynamicImage, String>,
    pub bounds: Option<Bounds>,
}

/// A page object the pipeline cares about, in content-stream order.
#[derive(Debug, Clone)]
pub enum PageItem {
    Text(TextSpan),
    Image(EmbeddedImage),
}

/// Everything extracted from one page.
///
/// In [`ConversionMode::Simple`] only `text` is filled; in
/// [`ConversionMode::Formatted`] only `items` is.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    /// 1-indexed page number.
    pub number: usize,
    pub text: String,
    pub items: Vec<PageItem>,
}

/// Opens PDF files.
pub trait PdfBackend {
    /// Open `path` for reading.
    ///
    /// # Errors
    /// [`ConvertError::CorruptPdf`], [`ConvertError::PasswordRequired`] or
    /// [`ConvertError::WrongPassword`] when the library refuses the file.
    fn open<'a>(
        &'a self,
        path: &Path,
        password: Option<&'a str>,
    ) -> Result<Box<dyn DocumentSource + 'a>, ConvertError>;
}

/// An open document. Dropping it releases the library handle.
pub trait DocumentSource {
    fn metadata(&self) -> &DocumentMetadata;

    /// Produce the next page, or `None` once every page has been handed out.
    ///
    /// An `Err` covers that page only; the caller may keep pulling.
    fn next_page(&mut self, mode: ConversionMode) -> Option<Result<PageContent, PageReadError>>;
}

/// A page the library could not load.
#[derive(Debug, Clone, PartialEq)]
pub struct PageReadError {
    pub page: usize,
    pub detail: String,
}

/// Single-pass iterator over a document's pages.
pub struct Pages<'s, 'a> {
    source: &'s mut (dyn DocumentSource + 'a),
    mode: ConversionMode,
}

impl<'s, 'a> Pages<'s, 'a> {
    pub fn new(source: &'s mut (dyn DocumentSource + 'a), mode: ConversionMode) -> Self {
        Self { source, mode }
    }
}

impl Iterator for Pages<'_, '_> {
    type Item = Result<PageContent, PageReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.source.next_page(self.mode)
    }
}
