//! Batch mode: expand inputs, plan output paths, convert one file at a time.
//!
//! A failure in one file never stops the rest; every input gets exactly one
//! [`ConversionResult`] in the returned [`BatchSummary`], in input order.

use crate::backend::PdfBackend;
use crate::config::ConversionConfig;
use crate::convert::convert_with_names;
use crate::error::ConvertError;
use crate::output::{BatchSummary, ConversionJob};
use crate::pipeline::images::ImageNames;
use crate::progress::BatchProgress;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Expand glob patterns and de-duplicate the input list.
///
/// Entries containing `*`, `?` or `[` are expanded (matches sorted, files
/// only); other entries are kept as given, even if they do not exist, so
/// the converter can report them as missing. The first occurrence of a path
/// wins.
///
/// # Errors
/// [`ConvertError::InvalidInput`] for a malformed pattern.
pub fn resolve_inputs<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<PathBuf>, ConvertError> {
    let mut seen = HashSet::new();
    let mut inputs = Vec::new();

    for pattern in patterns {
        let pattern = pattern.as_ref();
        if !is_glob(pattern) {
            let path = PathBuf::from(pattern);
            if seen.insert(path.clone()) {
                inputs.push(path);
            }
            continue;
        }

        let entries = glob::glob(pattern).map_err(|e| ConvertError::InvalidInput {
            input: pattern.to_string(),
            reason: e.to_string(),
        })?;
        let mut matched: Vec<PathBuf> = entries
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Skipping unreadable match for '{}': {}", pattern, e);
                    None
                }
            })
            .filter(|p| p.is_file())
            .collect();
        matched.sort();

        if matched.is_empty() {
            warn!("No files match '{}'", pattern);
        }
        for path in matched {
            if seen.insert(path.clone()) {
                inputs.push(path);
            }
        }
    }

    Ok(inputs)
}

fn ends_with_separator(path: &Path) -> bool {
    let s = path.as_os_str().to_string_lossy();
    s.ends_with('/') || s.ends_with(std::path::MAIN_SEPARATOR)
}

/// Decide where each input's Markdown goes.
///
/// * no `output`: `<input dir>/<stem>.md`
/// * one input and `output` is not a directory (existing, or written with a
///   trailing separator): `output` itself, `.md` added when it has no
///   extension
/// * otherwise `output` is a directory: `<output>/<stem>.md`, repeated stems
///   suffixed `_1`, `_2`, …
///
/// # Errors
/// [`ConvertError::InvalidInput`] when several inputs are pointed at a path
/// that looks like a single file.
pub fn plan_jobs(
    inputs: &[PathBuf],
    output: Option<&Path>,
) -> Result<Vec<ConversionJob>, ConvertError> {
    let Some(out) = output else {
        return Ok(inputs
            .iter()
            .map(|input| ConversionJob::new(input, input.with_extension("md")))
            .collect());
    };

    let is_dir = out.is_dir() || ends_with_separator(out);

    if !is_dir && inputs.len() == 1 {
        let target = if out.extension().is_none() {
            out.with_extension("md")
        } else {
            out.to_path_buf()
        };
        return Ok(vec![ConversionJob::new(&inputs[0], target)]);
    }

    if !is_dir && inputs.len() > 1 && out.extension().is_some() {
        return Err(ConvertError::InvalidInput {
            input: out.display().to_string(),
            reason: format!(
                "{} inputs need an output directory, not a file",
                inputs.len()
            ),
        });
    }

    let mut used = HashSet::new();
    Ok(inputs
        .iter()
        .map(|input| {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "document".to_string());
            let mut name = stem.clone();
            let mut n = 1;
            while !used.insert(name.clone()) {
                name = format!("{stem}_{n}");
                n += 1;
            }
            ConversionJob::new(input, out.join(format!("{name}.md")))
        })
        .collect())
}

/// Convert `jobs` sequentially.
///
/// Documents written into the same directory share its image folder; image
/// names are unique across the whole batch.
pub fn run_batch(
    backend: &dyn PdfBackend,
    jobs: &[ConversionJob],
    config: &ConversionConfig,
    progress: &dyn BatchProgress,
) -> BatchSummary {
    let total = jobs.len();
    progress.on_batch_start(total);
    info!("Converting {} file(s)", total);

    let mut names = ImageNames::new();
    let mut summary = BatchSummary::default();
    for (i, job) in jobs.iter().enumerate() {
        progress.on_file_start(i + 1, total, &job.input);
        let result = convert_with_names(backend, job, config, &mut names);
        progress.on_file_complete(i + 1, total, &result);
        summary.results.push(result);
    }

    info!(
        "Batch complete: {} succeeded, {} failed",
        summary.succeeded(),
        summary.failed()
    );
    progress.on_batch_complete(&summary);
    summary
}

/// [`resolve_inputs`] + [`plan_jobs`] + [`run_batch`].
///
/// # Errors
/// Only for unusable patterns or output targets; per-file failures are in
/// the summary.
pub fn convert_batch<S: AsRef<str>>(
    backend: &dyn PdfBackend,
    patterns: &[S],
    output: Option<&Path>,
    config: &ConversionConfig,
    progress: &dyn BatchProgress,
) -> Result<BatchSummary, ConvertError> {
    let inputs = resolve_inputs(patterns)?;
    if inputs.is_empty() {
        warn!("No input files to convert");
    }
    let jobs = plan_jobs(&inputs, output)?;
    Ok(run_batch(backend, &jobs, config, progress))
}
