//! Watch-loop tests: events are fed through a plain channel, so no file
//! system notifications are involved except in the `watch_folder_until`
//! cases.

mod common;

use common::*;
use pdftomarkd::watch::watch_folder_until;
use pdftomarkd::{run_watch_loop, ConversionConfig, ConvertError, WatchOptions, WatchSummary};
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;

fn one_page(word: &str) -> FakeDoc {
    FakeDoc::new(vec![page(1, vec![text(span(word, "Helvetica", 72.0, 720.0))])])
}

fn fast_options(out: &Path) -> WatchOptions {
    WatchOptions {
        output_dir: Some(out.to_path_buf()),
        settle_delay: Duration::from_millis(10),
        ..WatchOptions::default()
    }
}

#[tokio::test]
async fn dropped_pdf_is_converted() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("converted");
    let pdf = pdf_file(tmp.path(), "invoice.pdf");
    let backend = FakeBackend::new().with("invoice.pdf", one_page("Total"));

    let (tx, mut rx) = mpsc::channel(8);
    tx.send(pdf).await.unwrap();
    drop(tx);

    let summary = run_watch_loop(
        &mut rx,
        std::future::pending(),
        &backend,
        &fast_options(&out),
        &ConversionConfig::default(),
    )
    .await;

    assert_eq!(
        summary,
        WatchSummary {
            converted: 1,
            failed: 0,
            skipped: 0
        }
    );
    assert_eq!(
        std::fs::read_to_string(out.join("invoice.md")).unwrap(),
        "Total\n"
    );
}

#[tokio::test]
async fn irrelevant_events_are_ignored() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("converted");
    let pdf = pdf_file(tmp.path(), "a.PDF");
    let notes = tmp.path().join("notes.txt");
    std::fs::write(&notes, b"%PDF but not a pdf name").unwrap();
    let empty = tmp.path().join("empty.pdf");
    std::fs::write(&empty, b"").unwrap();
    let ghost = tmp.path().join("ghost.pdf");
    let backend = FakeBackend::new().with("a.PDF", one_page("alpha"));

    let (tx, mut rx) = mpsc::channel(8);
    for path in [notes, pdf.clone(), pdf, empty, ghost] {
        tx.send(path).await.unwrap();
    }
    drop(tx);

    let summary = run_watch_loop(
        &mut rx,
        std::future::pending(),
        &backend,
        &fast_options(&out),
        &ConversionConfig::default(),
    )
    .await;

    assert_eq!(
        summary,
        WatchSummary {
            converted: 1,
            failed: 0,
            skipped: 1
        }
    );
    assert!(out.join("a.md").is_file());
    assert!(!out.join("notes.md").exists());
    assert!(!out.join("empty.md").exists());
}

#[tokio::test]
async fn placeholder_is_converted_once_written() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("converted");
    let pdf = tmp.path().join("download.pdf");
    std::fs::write(&pdf, b"").unwrap();
    let backend = FakeBackend::new().with("download.pdf", one_page("finished"));

    let (tx, mut rx) = mpsc::channel(8);
    let finish_download = {
        let pdf = pdf.clone();
        async move {
            tx.send(pdf.clone()).await.unwrap();
            tokio::time::sleep(Duration::from_millis(200)).await;
            std::fs::write(&pdf, b"%PDF-1.7\n% complete\n").unwrap();
            tx.send(pdf).await.unwrap();
        }
    };

    let options = fast_options(&out);
    let config = ConversionConfig::default();
    let (summary, ()) = tokio::join!(
        run_watch_loop(
            &mut rx,
            std::future::pending(),
            &backend,
            &options,
            &config,
        ),
        finish_download
    );

    assert_eq!(
        summary,
        WatchSummary {
            converted: 1,
            failed: 0,
            skipped: 1
        }
    );
    assert_eq!(
        std::fs::read_to_string(out.join("download.md")).unwrap(),
        "finished\n"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn failure_does_not_stop_the_loop() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("converted");
    let bad = tmp.path().join("bad.pdf");
    std::fs::write(&bad, b"PK\x03\x04 zip archive").unwrap();
    let good = pdf_file(tmp.path(), "good.pdf");
    let backend = FakeBackend::new().with("good.pdf", one_page("fine"));

    let (tx, mut rx) = mpsc::channel(8);
    tx.send(bad).await.unwrap();
    tx.send(good).await.unwrap();
    drop(tx);

    let summary = run_watch_loop(
        &mut rx,
        std::future::pending(),
        &backend,
        &fast_options(&out),
        &ConversionConfig::default(),
    )
    .await;

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.converted, 1);
    assert!(out.join("good.md").is_file());
}

#[tokio::test]
async fn shutdown_ends_an_idle_loop() {
    let tmp = tempfile::tempdir().unwrap();
    let backend = FakeBackend::new();
    let (_tx, mut rx) = mpsc::channel::<std::path::PathBuf>(8);

    let summary = tokio::time::timeout(
        Duration::from_secs(5),
        run_watch_loop(
            &mut rx,
            tokio::time::sleep(Duration::from_millis(50)),
            &backend,
            &fast_options(tmp.path()),
            &ConversionConfig::default(),
        ),
    )
    .await
    .expect("loop should stop on shutdown");

    assert_eq!(summary, WatchSummary::default());
}

#[tokio::test(flavor = "multi_thread")]
async fn existing_pdfs_are_converted_once() {
    let tmp = tempfile::tempdir().unwrap();
    let watched = tmp.path().join("inbox");
    std::fs::create_dir(&watched).unwrap();
    pdf_file(&watched, "new.pdf");
    pdf_file(&watched, "done.pdf");
    let converted = watched.join("converted");
    std::fs::create_dir(&converted).unwrap();
    std::fs::write(converted.join("done.md"), "kept\n").unwrap();
    let backend = FakeBackend::new()
        .with("new.pdf", one_page("fresh"))
        .with("done.pdf", one_page("stale"));

    let summary = watch_folder_until(
        &watched,
        &backend,
        &WatchOptions::default(),
        &ConversionConfig::default(),
        async {},
    )
    .await
    .unwrap();

    assert_eq!(summary.converted, 1);
    assert_eq!(
        std::fs::read_to_string(converted.join("new.md")).unwrap(),
        "fresh\n"
    );
    assert_eq!(
        std::fs::read_to_string(converted.join("done.md")).unwrap(),
        "kept\n"
    );
}

#[tokio::test]
async fn missing_directory_is_a_setup_error() {
    let tmp = tempfile::tempdir().unwrap();
    let backend = FakeBackend::new();

    let err = watch_folder_until(
        &tmp.path().join("absent"),
        &backend,
        &WatchOptions::default(),
        &ConversionConfig::default(),
        async {},
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ConvertError::WatchSetupFailed { .. }));
}
