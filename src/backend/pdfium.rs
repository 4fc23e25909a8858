//! [`PdfBackend`] implementation on top of `pdfium-render`.
//!
//! pdfium does all the real work: parsing, font decoding, image decoding.
//! This module only copies what the pipeline needs out of pdfium's object
//! model into owned [`PageContent`] values, one page per call, so the pdfium
//! page handle never outlives [`DocumentSource::next_page`].
//!
//! The library handle (`PdfDocument`) lives inside [`PdfiumDocument`]; it is
//! closed when the boxed source is dropped, on success and error paths alike.

use super::{
    Bounds, DocumentSource, EmbeddedImage, FontInfo, PageContent, PageItem, PageReadError,
    PdfBackend, StyleFlags, TextSpan,
};
use crate::config::ConversionMode;
use crate::error::ConvertError;
use crate::output::DocumentMetadata;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// Font weight at or above which pdfium's answer counts as "bold".
const BOLD_WEIGHT: u32 = 600;

/// Backend bound to a loaded pdfium library.
pub struct PdfiumBackend {
    pdfium: Pdfium,
}

impl PdfiumBackend {
    pub fn new(pdfium: Pdfium) -> Self {
        Self { pdfium }
    }

    /// Bind to pdfium through `pdfium-auto`, downloading it on first use.
    pub fn bind() -> Result<Self, ConvertError> {
        pdfium_auto::bind(None)
            .map(Self::new)
            .map_err(|e| ConvertError::PdfiumBindingFailed(e.to_string()))
    }
}

impl PdfBackend for PdfiumBackend {
    fn open<'a>(
        &'a self,
        path: &Path,
        password: Option<&'a str>,
    ) -> Result<Box<dyn DocumentSource + 'a>, ConvertError> {
        let document = self
            .pdfium
            .load_pdf_from_file(path, password)
            .map_err(|e| classify_load_error(path, password.is_some(), &e))?;

        let total = document.pages().len() as usize;
        let metadata = read_metadata(&document, total);
        info!("PDF loaded: {} ({} pages)", path.display(), total);

        Ok(Box::new(PdfiumDocument {
            document,
            metadata,
            next: 0,
            total,
        }))
    }
}

/// An open pdfium document plus a cursor over its pages.
pub struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
    metadata: DocumentMetadata,
    next: usize,
    total: usize,
}

impl DocumentSource for PdfiumDocument<'_> {
    fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    fn next_page(&mut self, mode: ConversionMode) -> Option<Result<PageContent, PageReadError>> {
        if self.next >= self.total {
            return None;
        }
        let index = self.next;
        self.next += 1;
        let number = index + 1;

        let page = match self.document.pages().get(index as u16) {
            Ok(page) => page,
            Err(e) => {
                return Some(Err(PageReadError {
                    page: number,
                    detail: format!("{e:?}"),
                }))
            }
        };

        Some(match mode {
            ConversionMode::Simple => page
                .text()
                .map(|text| PageContent {
                    number,
                    text: text.all(),
                    items: Vec::new(),
                })
                .map_err(|e| PageReadError {
                    page: number,
                    detail: format!("{e:?}"),
                }),
            ConversionMode::Formatted => Ok(PageContent {
                number,
                text: String::new(),
                items: read_items(&page, number),
            }),
        })
    }
}

/// Form XObjects nested deeper than this are not entered.
const MAX_FORM_DEPTH: usize = 16;

/// Text and image objects of a page, in content-stream order.
///
/// Form XObjects (content blocks drawn with `Do`) are entered in place, so
/// text a generator or stamping tool wrapped in a form is not lost.
fn read_items(page: &PdfPage, number: usize) -> Vec<PageItem> {
    let mut items = Vec::new();
    for object in page.objects().iter() {
        collect_object(&object, 0, &mut items);
    }
    debug!("Page {}: {} text/image objects", number, items.len());
    items
}

fn collect_object(object: &PdfPageObject, depth: usize, items: &mut Vec<PageItem>) {
    match object {
        PdfPageObject::Text(text) => {
            if let Some(span) = text_span(text) {
                items.push(PageItem::Text(span));
            }
        }
        PdfPageObject::Image(image) => items.push(PageItem::Image(EmbeddedImage {
            decoded: image.get_raw_image().map_err(|e| format!("{e:?}")),
            bounds: image.bounds().ok().map(|b| {
                Bounds::new(b.left().value, b.bottom().value, b.right().value, b.top().value)
            }),
        })),
        PdfPageObject::XObjectForm(form) if depth < MAX_FORM_DEPTH => {
            for child in form.iter() {
                collect_object(&child, depth + 1, items);
            }
        }
        PdfPageObject::XObjectForm(_) => {
            warn!("Skipping form XObject nested more than {} levels deep", MAX_FORM_DEPTH);
        }
        _ => {}
    }
}

fn text_span(text: &PdfPageTextObject) -> Option<TextSpan> {
    let content = text.text();
    if content.is_empty() {
        return None;
    }
    let font = text.font();
    let bold = font
        .weight()
        .ok()
        .map(weight_value)
        .is_some_and(|w| w >= BOLD_WEIGHT)
        || font.is_bold_reenforced();
    Some(TextSpan {
        text: content,
        font: FontInfo {
            name: font.name(),
            flags: StyleFlags {
                bold: bold.then_some(true),
                italic: font.is_italic().then_some(true),
            },
        },
        font_size: text.scaled_font_size().value,
        bounds: text.bounds().ok().map(|b| {
            Bounds::new(b.left().value, b.bottom().value, b.right().value, b.top().value)
        }),
    })
}

fn weight_value(weight: PdfFontWeight) -> u32 {
    match weight {
        PdfFontWeight::Weight100 => 100,
        PdfFontWeight::Weight200 => 200,
        PdfFontWeight::Weight300 => 300,
        PdfFontWeight::Weight400Normal => 400,
        PdfFontWeight::Weight500 => 500,
        PdfFontWeight::Weight600 => 600,
        PdfFontWeight::Weight700Bold => 700,
        PdfFontWeight::Weight800 => 800,
        PdfFontWeight::Weight900 => 900,
        PdfFontWeight::Custom(w) => w,
    }
}

fn classify_load_error(path: &Path, had_password: bool, e: &PdfiumError) -> ConvertError {
    let detail = format!("{e:?}");
    if detail.contains("Password") || detail.contains("password") {
        if had_password {
            ConvertError::WrongPassword {
                path: path.to_path_buf(),
            }
        } else {
            ConvertError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
    } else {
        ConvertError::CorruptPdf {
            path: path.to_path_buf(),
            detail,
        }
    }
}

fn read_metadata(document: &PdfDocument, page_count: usize) -> DocumentMetadata {
    let metadata = document.metadata();
    let get = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata
            .get(tag)
            .map(|t| t.value().trim().to_string())
            .filter(|v| !v.is_empty())
    };

    DocumentMetadata {
        title: get(PdfDocumentMetadataTagType::Title),
        author: get(PdfDocumentMetadataTagType::Author),
        subject: get(PdfDocumentMetadataTagType::Subject),
        creator: get(PdfDocumentMetadataTagType::Creator),
        producer: get(PdfDocumentMetadataTagType::Producer),
        page_count,
    }
}
