//! Scan progress reporting.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::broadcast;

/// Progress information during a scan.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    /// Number of files described so far.
    pub files_scanned: u64,
    /// Number of files found by the walk.
    pub files_discovered: u64,
    /// Number of directories listed.
    pub dirs_scanned: u64,
    /// Total bytes of the files described so far.
    pub bytes_scanned: u64,
    /// Last file described.
    pub current_path: PathBuf,
    /// Number of errors/warnings encountered.
    pub errors_count: u64,
    /// Time elapsed since scan started.
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            files_scanned: 0,
            files_discovered: 0,
            dirs_scanned: 0,
            bytes_scanned: 0,
            current_path: PathBuf::new(),
            errors_count: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Calculate scan rate in files per second.
    pub fn files_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.files_scanned as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Fraction of discovered files already described, in `0.0..=1.0`.
    pub fn fraction_done(&self) -> f64 {
        if self.files_discovered == 0 {
            0.0
        } else {
            (self.files_scanned as f64 / self.files_discovered as f64).min(1.0)
        }
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared progress counters, updated from the hashing workers.
///
/// Every `interval` files a snapshot is broadcast. Sending without
/// subscribers is a no-op, so reporting never influences the scan.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    start_time: Instant,
    interval: u64,
    files_discovered: u64,
    dirs_scanned: u64,
    files_scanned: AtomicU64,
    bytes_scanned: AtomicU64,
    errors_count: AtomicU64,
    tx: broadcast::Sender<ScanProgress>,
}

impl ProgressTracker {
    pub fn new(
        tx: broadcast::Sender<ScanProgress>,
        interval: u64,
        files_discovered: u64,
        dirs_scanned: u64,
        errors_so_far: u64,
    ) -> Self {
        Self {
            start_time: Instant::now(),
            interval: interval.max(1),
            files_discovered,
            dirs_scanned,
            files_scanned: AtomicU64::new(0),
            bytes_scanned: AtomicU64::new(0),
            errors_count: AtomicU64::new(errors_so_far),
            tx,
        }
    }

    /// Record a described file and report if a milestone was reached.
    pub fn record_file(&self, path: &Path, size: u64, failed: bool) {
        self.bytes_scanned.fetch_add(size, Ordering::Relaxed);
        if failed {
            self.errors_count.fetch_add(1, Ordering::Relaxed);
        }
        let count = self.files_scanned.fetch_add(1, Ordering::Relaxed) + 1;
        if count % self.interval == 0 {
            self.report(path);
        }
    }

    /// Broadcast the current state.
    pub fn report(&self, path: &Path) {
        let _ = self.tx.send(self.snapshot(path));
    }

    pub fn snapshot(&self, path: &Path) -> ScanProgress {
        ScanProgress {
            files_scanned: self.files_scanned.load(Ordering::Relaxed),
            files_discovered: self.files_discovered,
            dirs_scanned: self.dirs_scanned,
            bytes_scanned: self.bytes_scanned.load(Ordering::Relaxed),
            current_path: path.to_path_buf(),
            errors_count: self.errors_count.load(Ordering::Relaxed),
            elapsed: self.start_time.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_on_interval() {
        let (tx, mut rx) = broadcast::channel(16);
        let tracker = ProgressTracker::new(tx, 2, 5, 1, 0);

        for i in 0..5 {
            tracker.record_file(Path::new("f"), 10, i == 0);
        }

        let first = rx.try_recv().unwrap();
        assert_eq!(first.files_scanned, 2);
        let second = rx.try_recv().unwrap();
        assert_eq!(second.files_scanned, 4);
        assert_eq!(second.bytes_scanned, 40);
        assert_eq!(second.errors_count, 1);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_no_subscriber_is_harmless() {
        let (tx, rx) = broadcast::channel(1);
        drop(rx);
        let tracker = ProgressTracker::new(tx, 1, 1, 1, 0);
        tracker.record_file(Path::new("f"), 1, false);
        assert_eq!(tracker.snapshot(Path::new("f")).files_scanned, 1);
    }

    #[test]
    fn test_fraction_done() {
        let mut progress = ScanProgress::new();
        assert_eq!(progress.fraction_done(), 0.0);
        progress.files_discovered = 4;
        progress.files_scanned = 1;
        assert_eq!(progress.fraction_done(), 0.25);
    }
}
