//! Core types for storewise.
//!
//! This crate provides the data model shared by the scanner and the
//! analysis engine: file entries and their fingerprints, the inventory
//! exchange format, scan configuration and the error taxonomy.

mod config;
mod entry;
mod error;
mod file_type;
mod inventory;

pub use config::{
    DEFAULT_LARGE_FILE_THRESHOLD, DEFAULT_PROGRESS_INTERVAL, ScanConfig, ScanConfigBuilder,
};
pub use entry::{
    ContentHash, EntryDefect, FileEntry, Fingerprint, MAX_ERROR_DETAIL, StorageClass,
    parse_timestamp,
};
pub use error::{InventoryError, ScanError, ScanWarning, WarningKind};
pub use file_type::FileType;
pub use inventory::{Inventory, InventoryMetadata, sum_sizes};
