//! Error types for the pdftomarkd library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ConvertError`] — **Fatal** for one document (bad input file, write
//!   failure) or for watch-mode start-up. Stored in
//!   [`crate::output::ConversionResult`] by the converter so a batch can carry
//!   on with the next file.
//!
//! * [`ExtractWarning`] — **Non-fatal**: one image could not be decoded or one
//!   page could not be loaded. The document is still written; the warning is
//!   attached to its result.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`ConvertError`] or [`ExtractWarning`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing, unreadable or invalid PDF.
    FileOpen,
    /// A single embedded image could not be decoded.
    ImageDecode,
    /// Writing the Markdown or an image file failed.
    OutputWrite,
    /// The watched directory could not be watched.
    WatchSetup,
    /// Bad command-line input or configuration.
    Config,
    /// Anything else.
    Internal,
}

/// All fatal errors returned by the pdftomarkd library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: Vec<u8> },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the Markdown file or an extracted image.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Watch errors ──────────────────────────────────────────────────────
    /// The directory to watch is missing or cannot be watched.
    #[error("Cannot watch '{path}': {detail}")]
    WatchSetupFailed { path: PathBuf, detail: String },

    // ── Input / config errors ─────────────────────────────────────────────
    /// An input pattern or output target cannot be used.
    #[error("Invalid input '{input}': {reason}")]
    InvalidInput { input: String, reason: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If the auto-download failed, set PDFIUM_LIB_PATH=/path/to/libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// The error-kind bucket used for reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConvertError::FileNotFound { .. }
            | ConvertError::PermissionDenied { .. }
            | ConvertError::NotAPdf { .. }
            | ConvertError::CorruptPdf { .. }
            | ConvertError::PasswordRequired { .. }
            | ConvertError::WrongPassword { .. } => ErrorKind::FileOpen,
            ConvertError::OutputWriteFailed { .. } => ErrorKind::OutputWrite,
            ConvertError::WatchSetupFailed { .. } => ErrorKind::WatchSetup,
            ConvertError::InvalidInput { .. } | ConvertError::InvalidConfig(_) => ErrorKind::Config,
            ConvertError::PdfiumBindingFailed(_) | ConvertError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::OutputWriteFailed {
            path: path.into(),
            source,
        }
    }
}

/// A non-fatal problem inside one document.
///
/// Stored in [`crate::output::ConversionResult::warnings`]; the document is
/// still converted.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum ExtractWarning {
    /// An embedded image could not be decoded or re-encoded as PNG.
    #[error("Page {page}: image {index} skipped: {detail}")]
    ImageDecode {
        page: usize,
        index: usize,
        detail: String,
    },

    /// pdfium could not load a page; its content is missing from the output.
    #[error("Page {page}: could not be read: {detail}")]
    PageRead { page: usize, detail: String },
}

impl ExtractWarning {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractWarning::ImageDecode { .. } => ErrorKind::ImageDecode,
            ExtractWarning::PageRead { .. } => ErrorKind::Internal,
        }
    }
}
