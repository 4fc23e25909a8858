//! Result types produced by the converter, batch runner and watch loop.

use crate::error::{ConvertError, ErrorKind, ExtractWarning};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Document information dictionary fields pdftomarkd uses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub page_count: usize,
}

/// An image written next to the Markdown file.
#[derive(Debug, Clone, PartialEq)]
pub struct PageImage {
    /// e.g. `image_2_0.png`
    pub file_name: String,
    /// Path as referenced from the Markdown, always `/`-separated,
    /// e.g. `images/image_2_0.png`.
    pub relative_path: String,
    /// Where the file was written.
    pub path: PathBuf,
    /// 1-indexed page number.
    pub page: usize,
    /// 0-indexed position among the images written for this page.
    pub index: usize,
    /// Position on the page, used to place the reference.
    pub bounds: Option<crate::backend::Bounds>,
}

/// One unit of work: convert `input` into `output`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl ConversionJob {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

/// Outcome of converting one input file.
#[derive(Debug)]
pub struct ConversionResult {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Images written for this document.
    pub images: Vec<PathBuf>,
    /// Pages that contributed content.
    pub pages: usize,
    /// Non-fatal problems (skipped images, unreadable pages).
    pub warnings: Vec<ExtractWarning>,
    /// `Some` when the document could not be converted.
    pub error: Option<ConvertError>,
    pub duration_ms: u64,
}

impl ConversionResult {
    pub(crate) fn failed(job: &ConversionJob, error: ConvertError, duration_ms: u64) -> Self {
        Self {
            input: job.input.clone(),
            output: job.output.clone(),
            images: Vec::new(),
            pages: 0,
            warnings: Vec::new(),
            error: Some(error),
            duration_ms,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(ConvertError::kind)
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    /// Serialisable snapshot for `--json` output.
    pub fn report(&self) -> ConversionReport {
        ConversionReport {
            input: self.input.clone(),
            output: self.output.clone(),
            success: self.succeeded(),
            images: self.images.clone(),
            pages: self.pages,
            warnings: self.warnings.iter().map(ToString::to_string).collect(),
            error_kind: self.error_kind(),
            error: self.error_message(),
            duration_ms: self.duration_ms,
        }
    }
}

/// JSON-friendly view of a [`ConversionResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub success: bool,
    pub images: Vec<PathBuf>,
    pub pages: usize,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// All results of one batch run, in input order.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub results: Vec<ConversionResult>,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    /// `true` when something was processed and nothing failed.
    pub fn all_succeeded(&self) -> bool {
        !self.results.is_empty() && self.failed() == 0
    }

    /// Process exit status: 0 when [`Self::all_succeeded`], else 1.
    pub fn exit_code(&self) -> u8 {
        if self.all_succeeded() {
            0
        } else {
            1
        }
    }

    pub fn reports(&self) -> Vec<ConversionReport> {
        self.results.iter().map(ConversionResult::report).collect()
    }
}
