//! Error types for scanning and inventory handling.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Scan root is missing or not a directory.
    #[error("Invalid scan root {path}: {reason}")]
    InvalidRoot { path: PathBuf, reason: String },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl ScanError {
    /// Root path that does not exist (or cannot be resolved).
    pub fn root_not_found(path: impl Into<PathBuf>, source: &std::io::Error) -> Self {
        Self::InvalidRoot {
            path: path.into(),
            reason: format!("path does not exist ({source})"),
        }
    }

    /// Root path that exists but is not a directory.
    pub fn root_not_directory(path: impl Into<PathBuf>) -> Self {
        Self::InvalidRoot {
            path: path.into(),
            reason: "path is not a directory".to_string(),
        }
    }

    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// A directory could not be listed; its subtree was skipped.
    DirectoryList,
    /// A file could not be read while fingerprinting.
    EntryRead,
    /// File metadata could not be read.
    MetadataError,
    /// File was too large to fingerprint.
    LargeFileSkipped,
}

/// Non-fatal warning encountered during scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Directory listing failed.
    pub fn directory_list(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        let path = path.into();
        Self {
            message: format!("Cannot list {}: {error}", path.display()),
            path,
            kind: WarningKind::DirectoryList,
        }
    }

    /// Reading file content failed.
    pub fn entry_read(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self::new(path, format!("Read error: {error}"), WarningKind::EntryRead)
    }

    /// Reading metadata failed.
    pub fn metadata(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self::new(
            path,
            format!("Metadata error: {error}"),
            WarningKind::MetadataError,
        )
    }

    /// File skipped by the fingerprint size limit.
    pub fn large_file_skipped(path: impl Into<PathBuf>, size: u64) -> Self {
        Self::new(
            path,
            format!("Not fingerprinted, {size} bytes exceeds the hash limit"),
            WarningKind::LargeFileSkipped,
        )
    }
}

/// Errors rejecting an inventory or one of its entries.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Payload does not have the inventory shape.
    #[error("Unsupported inventory format: {reason}")]
    UnsupportedFormat { reason: String },

    /// An entry carries data that cannot be analyzed.
    #[error("Malformed entry #{index} ({name}): {reason}")]
    MalformedEntry {
        index: usize,
        name: String,
        reason: String,
    },

    /// Payload is not valid JSON.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl InventoryError {
    pub(crate) fn unsupported(reason: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            reason: reason.into(),
        }
    }

    /// Malformed entry at `index`; `name` falls back to a placeholder.
    pub fn malformed(index: usize, name: Option<&str>, reason: impl Into<String>) -> Self {
        Self::MalformedEntry {
            index,
            name: name.unwrap_or("<unnamed>").to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_root_message() {
        let err = ScanError::root_not_directory("/tmp/file.txt");
        assert!(matches!(err, ScanError::InvalidRoot { .. }));
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn test_scan_warning_creation() {
        let error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let warning = ScanWarning::directory_list("/test/path", &error);
        assert_eq!(warning.kind, WarningKind::DirectoryList);
        assert!(warning.message.contains("denied"));
    }

    #[test]
    fn test_malformed_names_entry() {
        let err = InventoryError::malformed(3, None, "size is missing");
        assert_eq!(
            err.to_string(),
            "Malformed entry #3 (<unnamed>): size is missing"
        );
    }
}
