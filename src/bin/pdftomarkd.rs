//! CLI binary for pdftomarkd.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig` / `WatchOptions` and reports results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdftomarkd::{
    convert_batch, watch_folder, BatchProgress, BatchSummary, ConversionConfig, ConversionMode,
    ConversionResult, NoopProgress, PageSeparator, PdfiumBackend, Verbosity, WatchOptions,
};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress using indicatif ─────────────────────────────────────────────

/// Spinner anchored at the bottom of the terminal with one log line per
/// finished file printed above it.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Starting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl BatchProgress for CliProgress {
    fn on_batch_start(&self, total_files: usize) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_files} file(s)…"))
        ));
    }

    fn on_file_start(&self, index: usize, total: usize, input: &Path) {
        self.bar.set_prefix(format!("{index}/{total}"));
        self.bar.set_message(file_name(input));
    }

    fn on_file_complete(&self, _index: usize, _total: usize, result: &ConversionResult) {
        let elapsed = dim(&format!("{:.1}s", result.duration_ms as f64 / 1000.0));
        match result.error {
            None => {
                let mut detail = format!("{} pages", result.pages);
                if !result.images.is_empty() {
                    detail.push_str(&format!(", {} images", result.images.len()));
                }
                if !result.warnings.is_empty() {
                    detail.push_str(&format!(", {} warnings", result.warnings.len()));
                }
                self.bar.println(format!(
                    "  {} {}  →  {}  {}  {}",
                    green("✓"),
                    file_name(&result.input),
                    result.output.display(),
                    dim(&detail),
                    elapsed,
                ));
            }
            Some(ref e) => {
                // Keep the line short; the full error is in the log.
                let msg = e.to_string();
                let msg = msg.lines().next().unwrap_or_default();
                self.bar.println(format!(
                    "  {} {}  {}  {}",
                    red("✗"),
                    file_name(&result.input),
                    red(msg),
                    elapsed,
                ));
            }
        }
    }

    fn on_batch_complete(&self, _summary: &BatchSummary) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert one file (writes document.md next to it)
  pdftomarkd document.pdf

  # Convert to a specific file
  pdftomarkd document.pdf -o notes/document.md

  # Convert many files into a directory
  pdftomarkd 'scans/*.pdf' -o converted/

  # Plain text only: no emphasis, no images
  pdftomarkd --simple report.pdf

  # Watch a folder; results go to inbox/converted/
  pdftomarkd --watch inbox/

  # Machine-readable summary
  pdftomarkd --json --no-progress *.pdf > summary.json

OUTPUT:
  <name>.md, plus images/image_<page>_<n>.png beside it when the document
  contains images of at least --min-image-size pixels in both dimensions.

EXIT STATUS:
  0  every file converted (watch mode: stopped with Ctrl-C)
  1  at least one file failed, or nothing matched

ENVIRONMENT VARIABLES:
  PDFTOMARKD_*            Every option, e.g. PDFTOMARKD_OUTPUT, PDFTOMARKD_SIMPLE
  RUST_LOG                Override the log filter (e.g. pdftomarkd=debug)
  PDFIUM_LIB_PATH         Path to an existing libpdfium, skips auto-download
  PDFIUM_AUTO_CACHE_DIR   Override the default pdfium cache directory

SETUP:
  PDFium (~30 MB) is downloaded automatically on first run and cached in
  ~/.cache/pdftomarkd/pdfium-7690/. No manual library setup is required.
"#;

/// Convert PDF files to Markdown, keeping emphasis and images.
#[derive(Parser, Debug)]
#[command(
    name = "pdftomarkd",
    version,
    about = "Convert PDF files to Markdown, keeping bold/italic text and extracting images",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF files or glob patterns.
    #[arg(required_unless_present = "watch", conflicts_with = "watch")]
    inputs: Vec<String>,

    /// Output file (single input) or directory.
    #[arg(short, long, env = "PDFTOMARKD_OUTPUT")]
    output: Option<PathBuf>,

    /// Raw text only: no emphasis markup, no images.
    #[arg(long, env = "PDFTOMARKD_SIMPLE")]
    simple: bool,

    /// Watch DIR and convert PDFs as they arrive.
    #[arg(long, env = "PDFTOMARKD_WATCH", value_name = "DIR")]
    watch: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFTOMARKD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFTOMARKD_QUIET")]
    quiet: bool,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDFTOMARKD_PASSWORD")]
    password: Option<String>,

    /// Page separator: none, hr, comment, or custom string.
    #[arg(long, env = "PDFTOMARKD_SEPARATOR", default_value = "none")]
    separator: String,

    /// Omit the title / author / subject header.
    #[arg(long, env = "PDFTOMARKD_NO_METADATA")]
    no_metadata: bool,

    /// Skip images smaller than this many pixels in either dimension.
    #[arg(long, env = "PDFTOMARKD_MIN_IMAGE_SIZE", default_value_t = 32)]
    min_image_size: u32,

    /// Watch mode: wait this long after a file appears before opening it.
    #[arg(long, env = "PDFTOMARKD_SETTLE_MS", default_value_t = 1000)]
    settle_ms: u64,

    /// Disable the progress spinner.
    #[arg(long, env = "PDFTOMARKD_NO_PROGRESS")]
    no_progress: bool,

    /// Print the batch summary as JSON on stdout.
    #[arg(long, env = "PDFTOMARKD_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);

    // ── Logging setup ────────────────────────────────────────────────────
    // Per-file INFO lines duplicate what the spinner prints, so they are
    // hidden while it is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && cli.watch.is_none();
    let filter = if show_progress && verbosity == Verbosity::Normal {
        "warn"
    } else {
        verbosity.filter_directive()
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Ensure PDFium engine is available ───────────────────────────────────
    // On the very first run the library (~30 MB) is downloaded to the cache
    // directory; later runs only check that the file is there.
    if !pdfium_auto::is_available() {
        if !cli.quiet {
            let dl_bar = ProgressBar::new(0);
            dl_bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.cyan} {prefix:.bold}  \
                     [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏  ")
                .tick_strings(TICKS),
            );
            dl_bar.set_prefix("PDF engine");
            dl_bar.enable_steady_tick(Duration::from_millis(80));

            let bar = dl_bar.clone();
            tokio::task::block_in_place(|| {
                pdfium_auto::ensure_library(Some(&|downloaded, total| {
                    if let Some(t) = total {
                        if bar.length().unwrap_or(0) != t {
                            bar.set_length(t);
                        }
                    }
                    bar.set_position(downloaded);
                }))
            })
            .context("Failed to download PDFium engine")?;

            dl_bar.finish_with_message("ready ✓");
        } else {
            tokio::task::block_in_place(|| pdfium_auto::ensure_library(None))
                .context("Failed to download PDFium engine")?;
        }
    }

    let backend = tokio::task::block_in_place(PdfiumBackend::bind)
        .context("Failed to load PDFium engine")?;
    let config = build_config(&cli, verbosity)?;

    // ── Watch mode ───────────────────────────────────────────────────────
    if let Some(ref dir) = cli.watch {
        let options = WatchOptions {
            output_dir: cli.output.clone(),
            settle_delay: Duration::from_millis(cli.settle_ms),
            ..WatchOptions::default()
        };
        let summary = watch_folder(dir, &backend, &options, &config)
            .await
            .with_context(|| format!("Cannot watch {}", dir.display()))?;
        if !cli.quiet {
            eprintln!(
                "{} Stopped watching: {} converted, {} failed, {} skipped",
                cyan("◆"),
                summary.converted,
                summary.failed,
                summary.skipped
            );
        }
        return Ok(ExitCode::SUCCESS);
    }

    // ── Batch mode ───────────────────────────────────────────────────────
    let cli_progress = show_progress.then(CliProgress::new);
    let progress: &dyn BatchProgress = match cli_progress {
        Some(ref p) => p,
        None => &NoopProgress,
    };

    let summary = tokio::task::block_in_place(|| {
        convert_batch(
            &backend,
            cli.inputs.as_slice(),
            cli.output.as_deref(),
            &config,
            progress,
        )
    })
    .context("Cannot start conversion")?;

    if cli.json {
        let report = serde_json::json!({
            "succeeded": summary.succeeded(),
            "failed": summary.failed(),
            "files": summary.reports(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise summary")?
        );
    }

    if !cli.quiet && !cli.json {
        print_summary(&summary);
    }

    Ok(ExitCode::from(summary.exit_code()))
}

fn print_summary(summary: &BatchSummary) {
    let ok = summary.succeeded();
    let failed = summary.failed();
    if summary.results.is_empty() {
        eprintln!("{} No PDF files matched", red("✘"));
    } else if failed == 0 {
        eprintln!(
            "{} {} file(s) converted successfully",
            green("✔"),
            bold(&ok.to_string())
        );
    } else {
        eprintln!(
            "{} {}/{} file(s) converted  ({} failed)",
            if ok == 0 { red("✘") } else { cyan("⚠") },
            bold(&ok.to_string()),
            summary.results.len(),
            red(&failed.to_string()),
        );
    }
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, verbosity: Verbosity) -> Result<ConversionConfig> {
    let mode = if cli.simple {
        ConversionMode::Simple
    } else {
        ConversionMode::Formatted
    };

    let mut builder = ConversionConfig::builder()
        .mode(mode)
        .page_separator(PageSeparator::parse(&cli.separator))
        .include_metadata(!cli.no_metadata)
        .min_image_dimension(cli.min_image_size)
        .verbosity(verbosity);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }

    builder.build().context("Invalid configuration")
}
