use dff::duplicates::{DuplicateFinder, FinderConfig, ScanStatus};
use dff::progress::ProgressCallback;
use dff::signal::ShutdownHandler;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::tempdir;

/// Requests shutdown once a fixed number of full digests have completed.
struct CancelAfter {
    handler: ShutdownHandler,
    limit: usize,
    completed: AtomicUsize,
}

impl ProgressCallback for CancelAfter {
    fn on_phase_start(&self, _phase: &str, _total: usize) {}
    fn on_progress(&self, _current: usize, _path: &str) {}
    fn on_item_completed(&self, _bytes: u64) {
        if self.completed.fetch_add(1, Ordering::SeqCst) + 1 >= self.limit {
            self.handler.request_shutdown();
        }
    }
    fn on_phase_end(&self, _phase: &str) {}
}

#[test]
fn test_cancel_mid_run_reports_partial_groups() {
    let dir = tempdir().unwrap();
    for i in 1..=5 {
        let content = "x".repeat(i * 10);
        fs::write(dir.path().join(format!("a{i}")), &content).unwrap();
        fs::write(dir.path().join(format!("b{i}")), &content).unwrap();
    }

    let handler = ShutdownHandler::new();
    let callback = Arc::new(CancelAfter {
        handler: handler.clone(),
        limit: 2,
        completed: AtomicUsize::new(0),
    });
    let config = FinderConfig::default()
        .with_cpu_concurrency(1)
        .with_io_concurrency(1)
        .with_shutdown_flag(handler.get_flag())
        .with_progress_callback(callback);

    let report = DuplicateFinder::new(config)
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(report.status, ScanStatus::Cancelled);
    assert!(!report.groups.is_empty());
    assert!(report.groups.len() < 5);
    for group in &report.groups {
        assert_eq!(group.len(), 2);
    }
    // Cancelled reads are not warnings
    assert!(report.summary.warnings.is_empty());
}

#[test]
fn test_cancel_before_start_reports_nothing() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"same").unwrap();
    fs::write(dir.path().join("b"), b"same").unwrap();
    fs::write(dir.path().join("e1"), b"").unwrap();
    fs::write(dir.path().join("e2"), b"").unwrap();

    let handler = ShutdownHandler::new();
    handler.request_shutdown();
    let config = FinderConfig::default().with_shutdown_flag(handler.get_flag());

    let report = DuplicateFinder::new(config)
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(report.is_cancelled());
    assert!(report.groups.is_empty());
}

#[test]
fn test_reset_handler_allows_next_run() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"same").unwrap();
    fs::write(dir.path().join("b"), b"same").unwrap();

    let handler = ShutdownHandler::new();
    handler.request_shutdown();
    handler.reset();
    let config = FinderConfig::default().with_shutdown_flag(handler.get_flag());

    let report = DuplicateFinder::new(config)
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(report.status, ScanStatus::Completed);
    assert_eq!(report.groups.len(), 1);
}
