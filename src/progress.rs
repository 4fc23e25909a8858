//! Progress-callback trait for batch conversion events.
//!
//! Pass a `&dyn BatchProgress` to [`crate::batch::run_batch`] to receive
//! events as each file is converted. The CLI drives an `indicatif` spinner
//! from these; library callers can log, count, or ignore them.
//!
//! # Example
//!
//! ```rust
//! use pdftomarkd::{BatchProgress, ConversionResult};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct Counter(AtomicUsize);
//!
//! impl BatchProgress for Counter {
//!     fn on_file_complete(&self, _index: usize, _total: usize, _result: &ConversionResult) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//! ```

use crate::output::{BatchSummary, ConversionResult};
use std::path::Path;

/// Called by the batch runner as it works through its jobs.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Files are converted one at a time, so calls never
/// overlap.
pub trait BatchProgress {
    /// Called once before the first file.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called just before a file is opened.
    ///
    /// # Arguments
    /// * `index` — 1-indexed position in the batch
    /// * `total` — number of files in the batch
    /// * `input` — the PDF about to be converted
    fn on_file_start(&self, index: usize, total: usize, input: &Path) {
        let _ = (index, total, input);
    }

    /// Called when a file is done, successfully or not.
    fn on_file_complete(&self, index: usize, total: usize, result: &ConversionResult) {
        let _ = (index, total, result);
    }

    /// Called once after every file has been attempted.
    fn on_batch_complete(&self, summary: &BatchSummary) {
        let _ = summary;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgress;

impl BatchProgress for NoopProgress {}
