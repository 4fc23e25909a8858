//! # pdftomarkd
//!
//! Convert PDF documents to Markdown, keeping bold and italic emphasis and
//! extracting embedded images as PNG files.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    %PDF header, existence and permission check
//!  ├─ 2. Backend  pdfium: text objects (font, size, position) and images
//!  ├─ 3. Style    font flags / name → plain, **bold**, *italic*, ***both***
//!  ├─ 4. Images   decode → PNG → images/image_{page}_{n}.png
//!  ├─ 5. Emit     spans + image references → paragraphs per page
//!  ├─ 6. Polish   line endings, trailing blanks, invisible Unicode
//!  └─ 7. Output   atomic write of <name>.md
//! ```
//!
//! Files are converted one at a time, either as a batch
//! ([`batch::convert_batch`]) or as they appear in a watched folder
//! ([`watch::watch_folder`]).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdftomarkd::{convert_document, ConversionConfig, ConversionJob, PdfiumBackend};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = PdfiumBackend::bind()?;
//!     let job = ConversionJob::new("document.pdf", "document.md");
//!     let result = convert_document(&backend, &job, &ConversionConfig::default());
//!     if let Some(e) = result.error {
//!         return Err(e.into());
//!     }
//!     println!("{} images written", result.images.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdftomarkd` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdftomarkd = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod batch;
pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod watch;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{DocumentSource, PdfBackend, PdfiumBackend};
pub use batch::{convert_batch, plan_jobs, resolve_inputs, run_batch};
pub use config::{
    ConversionConfig, ConversionConfigBuilder, ConversionMode, PageSeparator, Verbosity,
    WatchOptions,
};
pub use convert::{convert_document, convert_with_names};
pub use error::{ConvertError, ErrorKind, ExtractWarning};
pub use output::{
    BatchSummary, ConversionJob, ConversionReport, ConversionResult, DocumentMetadata, PageImage,
};
pub use pipeline::images::ImageNames;
pub use progress::{BatchProgress, NoopProgress};
pub use watch::{run_watch_loop, watch_folder, FsEventSource, WatchSummary};
