//! Inventory scanner: walk, then fingerprint on a bounded worker pool.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use storewise_core::{
    FileEntry, Fingerprint, Inventory, InventoryMetadata, ScanConfig, ScanError, ScanWarning,
    WarningKind,
};

use crate::fingerprint::{Described, describe};
use crate::progress::{ProgressTracker, ScanProgress};
use crate::walk::walk;

/// Result of one scan.
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Canonical root path that was scanned.
    pub root_path: PathBuf,

    /// One entry per regular file, in traversal order.
    pub entries: Vec<FileEntry>,

    /// Sum of entry sizes.
    pub total_size: u64,

    /// Number of directories listed.
    pub dirs_scanned: u64,

    /// Soft failures met during the scan.
    pub warnings: Vec<ScanWarning>,

    /// The scan was cancelled; `entries` holds what was collected before.
    pub cancelled: bool,

    /// When the scan finished.
    pub scanned_at: DateTime<Utc>,

    /// Duration of the scan.
    pub scan_duration: Duration,
}

impl ScanResult {
    /// Number of entries.
    pub fn total_files(&self) -> u64 {
        self.entries.len() as u64
    }

    /// Check if there were any warnings during scanning.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Count warnings of one kind.
    pub fn warning_count(&self, kind: WarningKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }

    /// Scan metadata block for the exchange format.
    pub fn metadata(&self) -> InventoryMetadata {
        InventoryMetadata {
            scanned_path: self.root_path.to_string_lossy().into_owned(),
            scanned_at: self.scanned_at,
            total_files: self.total_files(),
            total_size: self.total_size,
        }
    }

    /// Convert into the exchange format.
    pub fn into_inventory(self) -> Inventory {
        let metadata = self.metadata();
        Inventory::new(self.entries).with_metadata(metadata)
    }
}

/// Scanner producing a flat inventory of a directory tree.
pub struct InventoryScanner {
    progress_tx: broadcast::Sender<ScanProgress>,
    cancel: CancellationToken,
}

impl InventoryScanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        Self::with_cancellation(CancellationToken::new())
    }

    /// Create a scanner that stops when `cancel` is cancelled.
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self {
            progress_tx,
            cancel,
        }
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Token that aborts running scans when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Perform a scan of the configured root.
    ///
    /// Only an invalid root or configuration fails the scan. Unreadable
    /// files and directories are recorded as warnings and sentinel
    /// fingerprints.
    pub fn scan(&self, config: &ScanConfig) -> Result<ScanResult, ScanError> {
        let start = Instant::now();
        let root_path = validate_root(&config.root)?;
        let ignore = config.ignore_matcher()?;

        info!(root = %root_path.display(), "scanning");

        let walk = walk(&root_path, config, &ignore, &self.cancel);
        debug!(
            files = walk.files.len(),
            dirs = walk.dirs_listed,
            warnings = walk.warnings.len(),
            "walk finished"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|i| format!("storewise-hash-{i}"))
            .build()
            .map_err(|e| ScanError::InvalidConfig {
                message: format!("cannot start hashing pool: {e}"),
            })?;

        let tracker = ProgressTracker::new(
            self.progress_tx.clone(),
            config.progress_interval,
            walk.files.len() as u64,
            walk.dirs_listed,
            walk.warnings.len() as u64,
        );

        // Indexed collect keeps traversal order regardless of scheduling.
        let described: Vec<Option<Described>> = pool.install(|| {
            walk.files
                .par_iter()
                .map(|candidate| {
                    if self.cancel.is_cancelled() {
                        return None;
                    }
                    let described = describe(candidate, config);
                    tracker.record_file(
                        &candidate.path,
                        described.entry.size,
                        matches!(described.entry.fingerprint, Fingerprint::Unreadable(_)),
                    );
                    Some(described)
                })
                .collect()
        });

        let cancelled = walk.cancelled || described.iter().any(Option::is_none);
        let mut warnings = walk.warnings;
        let mut entries = Vec::with_capacity(described.len());
        for d in described.into_iter().flatten() {
            warnings.extend(d.warning);
            entries.push(d.entry);
        }
        let total_size = entries.iter().fold(0u64, |total, e| total.saturating_add(e.size));

        tracker.report(&root_path);

        let result = ScanResult {
            root_path,
            entries,
            total_size,
            dirs_scanned: walk.dirs_listed,
            warnings,
            cancelled,
            scanned_at: Utc::now(),
            scan_duration: start.elapsed(),
        };

        info!(
            files = result.entries.len(),
            bytes = result.total_size,
            warnings = result.warnings.len(),
            cancelled = result.cancelled,
            "scan finished in {:.2}s",
            result.scan_duration.as_secs_f64()
        );

        Ok(result)
    }
}

impl Default for InventoryScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Check the root before anything is traversed.
fn validate_root(root: &Path) -> Result<PathBuf, ScanError> {
    let metadata = fs::metadata(root).map_err(|e| ScanError::root_not_found(root, &e))?;
    if !metadata.is_dir() {
        return Err(ScanError::root_not_directory(root));
    }
    root.canonicalize().map_err(|e| ScanError::io(root, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir(root.join("dir1")).unwrap();
        fs::create_dir(root.join("dir2")).unwrap();
        fs::create_dir(root.join("dir1/subdir")).unwrap();

        fs::write(root.join("file1.txt"), "hello").unwrap();
        fs::write(root.join("dir1/file2.txt"), "world world world").unwrap();
        fs::write(root.join("dir1/subdir/file3.txt"), "test").unwrap();
        fs::write(root.join("dir2/file4.txt"), "another file here").unwrap();

        temp
    }

    fn entry_names(result: &ScanResult) -> BTreeSet<String> {
        result.entries.iter().map(|e| e.name.to_string()).collect()
    }

    #[test]
    fn test_basic_scan() {
        let temp = create_test_tree();
        let result = InventoryScanner::new()
            .scan(&ScanConfig::new(temp.path()))
            .unwrap();

        assert_eq!(result.total_files(), 4);
        assert_eq!(result.total_size, 5 + 17 + 4 + 17);
        assert_eq!(result.dirs_scanned, 4);
        assert!(!result.cancelled);
        assert!(!result.has_warnings());
        assert_eq!(
            entry_names(&result),
            ["file1.txt", "file2.txt", "file3.txt", "file4.txt"]
                .into_iter()
                .map(String::from)
                .collect()
        );
    }

    #[test]
    fn test_single_thread_pool() {
        let temp = create_test_tree();
        let config = ScanConfig::builder()
            .root(temp.path())
            .threads(1usize)
            .build()
            .unwrap();
        let result = InventoryScanner::new().scan(&config).unwrap();
        assert_eq!(result.total_files(), 4);
    }

    #[test]
    fn test_root_is_file() {
        let temp = create_test_tree();
        let err = InventoryScanner::new()
            .scan(&ScanConfig::new(temp.path().join("file1.txt")))
            .unwrap_err();
        assert!(matches!(err, ScanError::InvalidRoot { .. }));
    }

    #[test]
    fn test_root_missing() {
        let temp = TempDir::new().unwrap();
        let err = InventoryScanner::new()
            .scan(&ScanConfig::new(temp.path().join("nope")))
            .unwrap_err();
        assert!(matches!(err, ScanError::InvalidRoot { .. }));
    }

    #[test]
    fn test_pre_cancelled_scan_returns_empty() {
        let temp = create_test_tree();
        let scanner = InventoryScanner::new();
        scanner.cancellation_token().cancel();

        let result = scanner.scan(&ScanConfig::new(temp.path())).unwrap();
        assert!(result.cancelled);
        assert!(result.entries.is_empty());
    }

    #[test]
    fn test_cancel_mid_scan_keeps_collected_entries() {
        let temp = TempDir::new().unwrap();
        let content = vec![42u8; 32 * 1024];
        for i in 0..2000 {
            fs::write(temp.path().join(format!("f{i:04}.bin")), &content).unwrap();
        }

        let config = ScanConfig::builder()
            .root(temp.path())
            .threads(1usize)
            .progress_interval(1u64)
            .build()
            .unwrap();
        let scanner = InventoryScanner::new();
        let mut rx = scanner.subscribe();
        let token = scanner.cancellation_token();
        let canceller = std::thread::spawn(move || {
            let first = rx.blocking_recv();
            token.cancel();
            first.map(|p| p.files_discovered)
        });

        let result = scanner.scan(&config).unwrap();
        let discovered = canceller.join().unwrap().unwrap();

        assert!(result.cancelled);
        assert_eq!(discovered, 2000);
        assert!(!result.entries.is_empty());
        assert!(result.total_files() < discovered);
    }

    #[test]
    fn test_into_inventory_metadata() {
        let temp = create_test_tree();
        let inventory = InventoryScanner::new()
            .scan(&ScanConfig::new(temp.path()))
            .unwrap()
            .into_inventory();

        let metadata = inventory.metadata.as_ref().unwrap();
        assert_eq!(metadata.total_files, 4);
        assert_eq!(metadata.total_size, inventory.total_size().unwrap());
    }
}
