//! Shared helpers for integration tests: an in-memory PDF backend.
//!
//! Documents are registered by file name. The files on disk only need a
//! `%PDF` header so they pass input validation; everything the converter
//! reads afterwards comes from the registered [`FakeDoc`].

#![allow(dead_code)]

use image::{DynamicImage, Rgba, RgbaImage};
use pdftomarkd::backend::{
    Bounds, DocumentSource, EmbeddedImage, PageContent, PageItem, PageReadError, PdfBackend,
    TextSpan,
};
use pdftomarkd::{ConversionMode, ConvertError, DocumentMetadata};
use std::cell::Cell;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Clone, Default)]
pub struct FakeDoc {
    pub metadata: DocumentMetadata,
    pub pages: Vec<Result<PageContent, PageReadError>>,
    pub password: Option<String>,
}

impl FakeDoc {
    pub fn new(pages: Vec<PageContent>) -> Self {
        let count = pages.len();
        Self {
            metadata: DocumentMetadata {
                page_count: count,
                ..Default::default()
            },
            pages: pages.into_iter().map(Ok).collect(),
            password: None,
        }
    }

    pub fn titled(mut self, title: &str, author: Option<&str>) -> Self {
        self.metadata.title = Some(title.to_string());
        self.metadata.author = author.map(str::to_string);
        self
    }
}

/// Backend serving registered documents; counts open handles.
#[derive(Default)]
pub struct FakeBackend {
    docs: HashMap<String, FakeDoc>,
    open_handles: Rc<Cell<isize>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, file_name: &str, doc: FakeDoc) -> Self {
        self.docs.insert(file_name.to_string(), doc);
        self
    }

    /// Documents opened and not yet dropped.
    pub fn open_handles(&self) -> isize {
        self.open_handles.get()
    }
}

struct FakeSource {
    metadata: DocumentMetadata,
    pages: VecDeque<Result<PageContent, PageReadError>>,
    open_handles: Rc<Cell<isize>>,
}

impl Drop for FakeSource {
    fn drop(&mut self) {
        self.open_handles.set(self.open_handles.get() - 1);
    }
}

impl DocumentSource for FakeSource {
    fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    fn next_page(&mut self, mode: ConversionMode) -> Option<Result<PageContent, PageReadError>> {
        self.pages.pop_front().map(|page| {
            page.map(|mut p| {
                match mode {
                    ConversionMode::Simple => p.items.clear(),
                    ConversionMode::Formatted => p.text.clear(),
                }
                p
            })
        })
    }
}

impl PdfBackend for FakeBackend {
    fn open<'a>(
        &'a self,
        path: &Path,
        password: Option<&'a str>,
    ) -> Result<Box<dyn DocumentSource + 'a>, ConvertError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let doc = self.docs.get(&name).ok_or_else(|| ConvertError::CorruptPdf {
            path: path.to_path_buf(),
            detail: "no such fake document".to_string(),
        })?;

        if let Some(ref expected) = doc.password {
            match password {
                None => {
                    return Err(ConvertError::PasswordRequired {
                        path: path.to_path_buf(),
                    })
                }
                Some(p) if p != expected.as_str() => {
                    return Err(ConvertError::WrongPassword {
                        path: path.to_path_buf(),
                    })
                }
                Some(_) => {}
            }
        }

        self.open_handles.set(self.open_handles.get() + 1);
        Ok(Box::new(FakeSource {
            metadata: doc.metadata.clone(),
            pages: doc.pages.iter().cloned().collect(),
            open_handles: Rc::clone(&self.open_handles),
        }))
    }
}

// ── Builders ─────────────────────────────────────────────────────────────────

/// A 12 pt span whose box starts at (`left`, `top`).
pub fn span(text: &str, font: &str, left: f32, top: f32) -> TextSpan {
    let width = text.len() as f32 * 6.0;
    TextSpan::plain(text)
        .with_font(font)
        .with_bounds(Bounds::new(left, top - 12.0, left + width, top))
}

/// A page carrying `items`; the simple-mode text is the spans' text, one per
/// line, the way pdfium's text API reports it.
pub fn page(number: usize, items: Vec<PageItem>) -> PageContent {
    let text = items
        .iter()
        .filter_map(|item| match item {
            PageItem::Text(s) => Some(s.text.as_str()),
            PageItem::Image(_) => None,
        })
        .collect::<Vec<_>>()
        .join("\r\n");
    PageContent {
        number,
        text,
        items,
    }
}

pub fn text(span: TextSpan) -> PageItem {
    PageItem::Text(span)
}

pub fn picture(width: u32, height: u32, bounds: Option<Bounds>) -> PageItem {
    PageItem::Image(EmbeddedImage {
        decoded: Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([200, 30, 30, 255]),
        ))),
        bounds,
    })
}

pub fn broken_picture(detail: &str) -> PageItem {
    PageItem::Image(EmbeddedImage {
        decoded: Err(detail.to_string()),
        bounds: None,
    })
}

/// Write a file that passes the `%PDF` check.
pub fn pdf_file(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"%PDF-1.7\n% fake\n").expect("write fixture");
    path
}
