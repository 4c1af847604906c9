//! Inventory scanner for storewise.
//!
//! This crate walks a directory tree and produces one [`FileEntry`] per
//! regular file, with its size, modification time, type and a BLAKE3
//! content fingerprint.
//!
//! # Overview
//!
//! - **Depth-first walk** over an explicit work stack; unreadable
//!   directories are skipped with a warning and the walk goes on
//! - **Parallel fingerprinting** on a bounded rayon pool, with a size
//!   limit above which files are not read
//! - **Progress updates** via broadcast channels
//! - **Cooperative cancellation** between files, keeping partial results
//!
//! # Example
//!
//! ```rust,no_run
//! use storewise_scan::{InventoryScanner, ScanConfig};
//!
//! let config = ScanConfig::new("/path/to/scan");
//! let scanner = InventoryScanner::new();
//! let result = scanner.scan(&config).unwrap();
//!
//! println!("Total size: {} bytes", result.total_size);
//! println!("Total files: {}", result.total_files());
//! ```
//!
//! # Progress Monitoring
//!
//! ```rust,no_run
//! use storewise_scan::{InventoryScanner, ScanConfig};
//!
//! let scanner = InventoryScanner::new();
//! let mut progress_rx = scanner.subscribe();
//!
//! std::thread::spawn(move || {
//!     while let Ok(progress) = progress_rx.blocking_recv() {
//!         println!("Scanned {} files", progress.files_scanned);
//!     }
//! });
//! ```

mod fingerprint;
mod progress;
mod scanner;
mod walk;

pub use fingerprint::hash_file;
pub use progress::ScanProgress;
pub use scanner::{InventoryScanner, ScanResult};

// Re-export core types for convenience
pub use storewise_core::{
    FileEntry, Fingerprint, Inventory, ScanConfig, ScanError, ScanWarning, WarningKind,
};
