//! Single-document conversion: one PDF in, one Markdown file out.
//!
//! [`convert_document`] never returns `Err`: every fatal problem is caught at
//! this boundary, logged with the file path and stored in the returned
//! [`ConversionResult`], so batch and watch callers can keep going.

use crate::backend::{PageContent, PageItem, Pages, PdfBackend};
use crate::config::{ConversionConfig, ConversionMode, Verbosity};
use crate::error::{ConvertError, ExtractWarning};
use crate::output::{ConversionJob, ConversionResult, PageImage};
use crate::pipeline::emit::{self, EmitOptions};
use crate::pipeline::images::{ImageNames, ImageSink};
use crate::pipeline::{input, postprocess};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Convert `job.input` into `job.output`.
///
/// Steps: validate the file, open it through `backend`, emit the optional
/// metadata header, walk the pages once, assemble and clean the Markdown,
/// then write it atomically (`<name>.tmp` + rename).
///
/// The same input and config always produce byte-identical output.
pub fn convert_document(
    backend: &dyn PdfBackend,
    job: &ConversionJob,
    config: &ConversionConfig,
) -> ConversionResult {
    convert_with_names(backend, job, config, &mut ImageNames::new())
}

/// [`convert_document`] taking image file names from a registry shared with
/// the other documents of the same batch or watch session.
pub fn convert_with_names(
    backend: &dyn PdfBackend,
    job: &ConversionJob,
    config: &ConversionConfig,
    names: &mut ImageNames,
) -> ConversionResult {
    let start = Instant::now();
    debug!("Converting {} → {}", job.input.display(), job.output.display());

    match run(backend, job, config, names) {
        Ok(done) => {
            let duration_ms = start.elapsed().as_millis() as u64;
            if config.verbosity >= Verbosity::Normal {
                info!(
                    "Converted {} → {} ({} pages, {} images, {} warnings, {}ms)",
                    job.input.display(),
                    job.output.display(),
                    done.pages,
                    done.images.len(),
                    done.warnings.len(),
                    duration_ms
                );
            }
            ConversionResult {
                input: job.input.clone(),
                output: job.output.clone(),
                images: done.images,
                pages: done.pages,
                warnings: done.warnings,
                error: None,
                duration_ms,
            }
        }
        Err(e) => {
            error!("{}: {}", job.input.display(), e);
            ConversionResult::failed(job, e, start.elapsed().as_millis() as u64)
        }
    }
}

struct Converted {
    images: Vec<PathBuf>,
    pages: usize,
    warnings: Vec<ExtractWarning>,
}

fn run(
    backend: &dyn PdfBackend,
    job: &ConversionJob,
    config: &ConversionConfig,
    names: &mut ImageNames,
) -> Result<Converted, ConvertError> {
    // ── Step 1: Validate input ───────────────────────────────────────────
    input::check_pdf(&job.input)?;

    // ── Step 2: Open ─────────────────────────────────────────────────────
    let mut source = backend.open(&job.input, config.password.as_deref())?;

    // ── Step 3: Metadata header ──────────────────────────────────────────
    let header = if config.include_metadata {
        emit::metadata_header(source.metadata())
    } else {
        None
    };

    // ── Step 4: Pages ────────────────────────────────────────────────────
    let opts = EmitOptions {
        paragraph_gap_ratio: config.paragraph_gap_ratio,
    };
    let mut sink = ImageSink::new(
        &job.output,
        &config.image_dir_name,
        config.min_image_dimension,
        names,
    );
    let mut warnings = Vec::new();
    let mut images = Vec::new();
    let mut pages: Vec<(usize, String)> = Vec::new();

    for page in Pages::new(source.as_mut(), config.mode) {
        let page = match page {
            Ok(p) => p,
            Err(e) => {
                warn!("{}: page {} unreadable: {}", job.input.display(), e.page, e.detail);
                warnings.push(ExtractWarning::PageRead {
                    page: e.page,
                    detail: e.detail,
                });
                continue;
            }
        };
        let number = page.number;
        let (markdown, written) = render_page(page, config.mode, &mut sink, &opts, &mut warnings)?;
        if config.verbosity == Verbosity::Verbose {
            debug!(
                "Page {}: {} chars, {} images",
                number,
                markdown.len(),
                written.len()
            );
        }
        images.extend(written.into_iter().map(|i| i.path));
        if !markdown.trim().is_empty() {
            pages.push((number, markdown));
        }
    }
    drop(source);

    // ── Step 5: Assemble + clean ─────────────────────────────────────────
    let markdown = postprocess::clean_markdown(&emit::assemble_document(
        header.as_deref(),
        &pages,
        &config.page_separator,
    ));

    // ── Step 6: Write ────────────────────────────────────────────────────
    write_atomic(&job.output, &markdown)?;

    Ok(Converted {
        images,
        pages: pages.len(),
        warnings,
    })
}

fn render_page(
    page: PageContent,
    mode: ConversionMode,
    sink: &mut ImageSink,
    opts: &EmitOptions,
    warnings: &mut Vec<ExtractWarning>,
) -> Result<(String, Vec<PageImage>), ConvertError> {
    if mode.is_simple() {
        return Ok((emit::emit_simple_page(&page.text), Vec::new()));
    }

    let mut spans = Vec::new();
    let mut embedded = Vec::new();
    for item in page.items {
        match item {
            PageItem::Text(span) => spans.push(span),
            PageItem::Image(image) => embedded.push(image),
        }
    }
    let written = sink.write_page_images(page.number, &embedded, warnings)?;
    Ok((emit::emit_page(&spans, &written, opts), written))
}

/// `<name>.tmp` beside `path`.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("output"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `contents` to `path` via a temp file and rename, creating parent
/// directories as needed.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<(), ConvertError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConvertError::write_failed(path, e))?;
    }

    let tmp = temp_path(path);
    std::fs::write(&tmp, contents).map_err(|e| ConvertError::write_failed(path, e))?;
    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        ConvertError::write_failed(path, e)
    })
}
