//! Folder watching: convert each PDF that lands in a directory.
//!
//! ```text
//!  notify thread ──blocking_send──▶ mpsc (bounded) ──recv──▶ watch loop
//!                                                         │
//!                                      settle delay, size check, convert
//! ```
//!
//! The loop itself only sees a `Receiver<PathBuf>`, so tests drive it from a
//! plain channel without touching the file-system notifier. The PDF backend
//! is not `Send`, so conversions run on the loop's own thread: inside
//! `block_in_place` on a multi-thread runtime, directly on a current-thread
//! one. Either way one conversion blocks the loop until it finishes.

use crate::backend::PdfBackend;
use crate::config::{ConversionConfig, WatchOptions};
use crate::convert::convert_with_names;
use crate::error::ConvertError;
use crate::output::{ConversionJob, ConversionResult};
use crate::pipeline::images::ImageNames;
use crate::pipeline::input::has_pdf_extension;
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Counts reported when the watch loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchSummary {
    pub converted: usize,
    pub failed: usize,
    /// Zero-length files that were reported and left alone.
    pub skipped: usize,
}

impl WatchSummary {
    fn record(&mut self, result: &ConversionResult) {
        if result.succeeded() {
            self.converted += 1;
        } else {
            self.failed += 1;
        }
    }

    fn merge(self, other: WatchSummary) -> Self {
        Self {
            converted: self.converted + other.converted,
            failed: self.failed + other.failed,
            skipped: self.skipped + other.skipped,
        }
    }
}

/// Paths from a notify event that may be a newly arrived file.
///
/// Creations qualify, and so do renames into the directory (the usual way
/// downloaders and editors publish a finished file).
pub fn candidate_paths(event: &Event) -> Vec<PathBuf> {
    match event.kind {
        EventKind::Create(_) => event.paths.clone(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            event.paths.last().cloned().into_iter().collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To | RenameMode::Any)) => {
            event.paths.clone()
        }
        _ => Vec::new(),
    }
}

/// A notify watcher on one directory feeding a bounded channel.
///
/// Dropping the watcher releases the OS watch and closes the channel.
pub struct FsEventSource {
    watcher: RecommendedWatcher,
    events: mpsc::Receiver<PathBuf>,
}

impl FsEventSource {
    /// Start watching `dir` (non-recursively).
    ///
    /// # Errors
    /// [`ConvertError::WatchSetupFailed`] when `dir` is not a directory or the
    /// OS watch cannot be installed.
    pub fn watch(dir: &Path, capacity: usize) -> Result<Self, ConvertError> {
        if !dir.is_dir() {
            return Err(ConvertError::WatchSetupFailed {
                path: dir.to_path_buf(),
                detail: "not an existing directory".to_string(),
            });
        }

        let (tx, rx) = mpsc::channel(capacity.max(1));
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for path in candidate_paths(&event) {
                    if tx.blocking_send(path).is_err() {
                        return;
                    }
                }
            }
            Err(e) => warn!("File watcher error: {}", e),
        })
        .map_err(|e| ConvertError::WatchSetupFailed {
            path: dir.to_path_buf(),
            detail: e.to_string(),
        })?;

        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| ConvertError::WatchSetupFailed {
                path: dir.to_path_buf(),
                detail: e.to_string(),
            })?;

        debug!("Watching {}", dir.display());
        Ok(Self {
            watcher,
            events: rx,
        })
    }

    /// Split into the watcher handle (keep it alive) and the event queue.
    pub fn into_parts(self) -> (RecommendedWatcher, mpsc::Receiver<PathBuf>) {
        (self.watcher, self.events)
    }
}

fn markdown_target(output_dir: &Path, pdf: &Path) -> PathBuf {
    let stem = pdf
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    output_dir.join(format!("{stem}.md"))
}

fn output_dir_for(options: &WatchOptions, pdf: &Path) -> PathBuf {
    match pdf.parent() {
        Some(parent) => options.resolve_output_dir(parent),
        None => options.resolve_output_dir(Path::new(".")),
    }
}

/// Run one conversion without leaving the current thread.
fn convert_here(
    backend: &dyn PdfBackend,
    job: &ConversionJob,
    config: &ConversionConfig,
    names: &mut ImageNames,
) -> ConversionResult {
    let multi_thread = Handle::try_current()
        .map(|h| h.runtime_flavor() == RuntimeFlavor::MultiThread)
        .unwrap_or(false);
    if multi_thread {
        tokio::task::block_in_place(|| convert_with_names(backend, job, config, names))
    } else {
        convert_with_names(backend, job, config, names)
    }
}

/// Paths handled so far and the image names they took.
#[derive(Debug, Default)]
struct Session {
    seen: HashSet<PathBuf>,
    names: ImageNames,
}

/// Convert each PDF path received on `events` until `shutdown` resolves or
/// the queue closes.
///
/// Per path: non-PDF names and paths already converted (or attempted) are
/// ignored; after the settle delay, vanished files are ignored and empty
/// files are reported and skipped. Vanished and empty files are not marked
/// as handled, so a later event for the same path (a finished download
/// replacing its placeholder) is still picked up. Failed conversions are
/// logged and not retried.
pub async fn run_watch_loop<F>(
    events: &mut mpsc::Receiver<PathBuf>,
    shutdown: F,
    backend: &dyn PdfBackend,
    options: &WatchOptions,
    config: &ConversionConfig,
) -> WatchSummary
where
    F: Future<Output = ()>,
{
    watch_loop(events, shutdown, backend, options, config, Session::default()).await
}

async fn watch_loop<F>(
    events: &mut mpsc::Receiver<PathBuf>,
    shutdown: F,
    backend: &dyn PdfBackend,
    options: &WatchOptions,
    config: &ConversionConfig,
    mut session: Session,
) -> WatchSummary
where
    F: Future<Output = ()>,
{
    let mut summary = WatchSummary::default();
    tokio::pin!(shutdown);

    loop {
        let path = tokio::select! {
            _ = &mut shutdown => {
                info!("Stopping watch");
                break;
            }
            next = events.recv() => match next {
                Some(path) => path,
                None => {
                    debug!("Event queue closed");
                    break;
                }
            },
        };

        if !has_pdf_extension(&path) {
            debug!("Ignoring non-PDF {}", path.display());
            continue;
        }
        if session.seen.contains(&path) {
            debug!("Already handled {}", path.display());
            continue;
        }

        tokio::select! {
            _ = &mut shutdown => {
                info!("Stopping watch");
                break;
            }
            _ = tokio::time::sleep(options.settle_delay) => {}
        }

        match std::fs::metadata(&path) {
            Err(_) => {
                debug!("{} disappeared before conversion", path.display());
                continue;
            }
            Ok(meta) if meta.len() == 0 => {
                warn!("{} is empty; skipping", path.display());
                summary.skipped += 1;
                continue;
            }
            Ok(_) => {}
        }

        info!("New PDF: {}", path.display());
        session.seen.insert(path.clone());
        let job = ConversionJob::new(&path, markdown_target(&output_dir_for(options, &path), &path));
        let result = convert_here(backend, &job, config, &mut session.names);
        summary.record(&result);
    }

    summary
}

/// Resolves when Ctrl-C is pressed. If the handler cannot be installed the
/// future never resolves and the watch only ends with its event queue.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Watch `dir` until Ctrl-C.
///
/// See [`watch_folder_until`].
pub async fn watch_folder(
    dir: &Path,
    backend: &dyn PdfBackend,
    options: &WatchOptions,
    config: &ConversionConfig,
) -> Result<WatchSummary, ConvertError> {
    watch_folder_until(dir, backend, options, config, ctrl_c()).await
}

/// Watch `dir`, converting new PDFs into the output directory, until
/// `shutdown` resolves.
///
/// The output directory (default `<dir>/converted`) is created first. With
/// [`WatchOptions::process_existing`], PDFs already in `dir` whose Markdown
/// does not exist yet are converted before waiting for new ones.
///
/// # Errors
/// [`ConvertError::WatchSetupFailed`] when the directory cannot be watched or
/// the output directory cannot be created.
pub async fn watch_folder_until<F>(
    dir: &Path,
    backend: &dyn PdfBackend,
    options: &WatchOptions,
    config: &ConversionConfig,
    shutdown: F,
) -> Result<WatchSummary, ConvertError>
where
    F: Future<Output = ()>,
{
    let output_dir = options.resolve_output_dir(dir);
    let source = FsEventSource::watch(dir, options.queue_capacity)?;
    std::fs::create_dir_all(&output_dir).map_err(|e| ConvertError::WatchSetupFailed {
        path: output_dir.clone(),
        detail: e.to_string(),
    })?;
    let options = WatchOptions {
        output_dir: Some(output_dir.clone()),
        ..options.clone()
    };

    let mut session = Session::default();
    let mut summary = WatchSummary::default();
    if options.process_existing {
        for pdf in existing_pdfs(dir)? {
            let target = markdown_target(&output_dir, &pdf);
            if target.exists() {
                session.seen.insert(pdf);
                continue;
            }
            if std::fs::metadata(&pdf).map(|m| m.len() == 0).unwrap_or(true) {
                debug!("{} is empty; waiting for it to be written", pdf.display());
                continue;
            }
            info!("Converting existing {}", pdf.display());
            session.seen.insert(pdf.clone());
            let job = ConversionJob::new(&pdf, target);
            let result = convert_here(backend, &job, config, &mut session.names);
            summary.record(&result);
        }
    }

    info!(
        "Watching {} for new PDFs → {} (Ctrl-C to stop)",
        dir.display(),
        output_dir.display()
    );
    let (watcher, mut events) = source.into_parts();
    let watched = watch_loop(&mut events, shutdown, backend, &options, config, session).await;
    drop(watcher);

    Ok(summary.merge(watched))
}

fn existing_pdfs(dir: &Path) -> Result<Vec<PathBuf>, ConvertError> {
    let entries = std::fs::read_dir(dir).map_err(|e| ConvertError::WatchSetupFailed {
        path: dir.to_path_buf(),
        detail: e.to_string(),
    })?;
    let mut pdfs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && has_pdf_extension(p))
        .collect();
    pdfs.sort();
    Ok(pdfs)
}
