//! Inventory exchange format.
//!
//! An inventory is a JSON object with a `files` array of entries and an
//! optional `metadata` block describing the scan that produced it:
//!
//! ```json
//! {
//!   "files": [
//!     {
//!       "name": "backup_2023.zip",
//!       "size": 524288000,
//!       "lastModified": "2023-03-15T10:30:00Z",
//!       "type": "backup",
//!       "storageClass": "standard",
//!       "hash": "abc123def456"
//!     }
//!   ],
//!   "metadata": { "scannedPath": "/data", "scannedAt": "...", "totalFiles": 1, "totalSize": 524288000 }
//! }
//! ```

use std::io::Read;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entry::{FileEntry, RawEntry};
use crate::error::InventoryError;

/// Information about the scan that produced an inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryMetadata {
    /// Root path that was scanned.
    pub scanned_path: String,
    /// When the scan finished.
    pub scanned_at: DateTime<Utc>,
    /// Number of entries.
    pub total_files: u64,
    /// Sum of entry sizes in bytes.
    pub total_size: u64,
}

/// A flat list of file entries, as exchanged between scanner and analyzer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    /// File entries in the order they were produced.
    pub files: Vec<FileEntry>,

    /// Scan information, when produced by the scanner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<InventoryMetadata>,
}

impl Inventory {
    /// Create an inventory without scan metadata.
    pub fn new(files: Vec<FileEntry>) -> Self {
        Self {
            files,
            metadata: None,
        }
    }

    /// Attach scan metadata.
    pub fn with_metadata(mut self, metadata: InventoryMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Parse an inventory from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, InventoryError> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Parse an inventory from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, InventoryError> {
        Self::from_value(serde_json::from_reader(reader)?)
    }

    /// Validate and convert an already-parsed JSON payload.
    ///
    /// The payload shape is checked before any entry is looked at. Entries
    /// are then converted in order and the first bad one fails the whole
    /// payload.
    pub fn from_value(value: Value) -> Result<Self, InventoryError> {
        let Value::Object(mut payload) = value else {
            return Err(InventoryError::unsupported("payload is not a JSON object"));
        };

        let raw_files = match payload.remove("files") {
            Some(Value::Array(files)) => files,
            Some(_) => return Err(InventoryError::unsupported("`files` is not an array")),
            None => return Err(InventoryError::unsupported("missing `files` array")),
        };

        let files = raw_files
            .into_iter()
            .enumerate()
            .map(|(index, raw)| parse_entry(index, raw))
            .collect::<Result<Vec<_>, _>>()?;

        // Metadata is informational only; a damaged block is dropped.
        let metadata = payload
            .remove("metadata")
            .and_then(|m| serde_json::from_value(m).ok());

        Ok(Self { files, metadata })
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, InventoryError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if the inventory has no entries.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Sum of entry sizes.
    pub fn total_size(&self) -> Result<u64, InventoryError> {
        sum_sizes(&self.files)
    }
}

/// Sum the sizes of `entries`.
///
/// Fails with [`InventoryError::MalformedEntry`] naming the first entry
/// whose size pushes the total past `u64::MAX` bytes.
pub fn sum_sizes(entries: &[FileEntry]) -> Result<u64, InventoryError> {
    entries
        .iter()
        .enumerate()
        .try_fold(0u64, |total, (index, entry)| {
            total.checked_add(entry.size).ok_or_else(|| {
                InventoryError::malformed(
                    index,
                    Some(entry.name.as_str()),
                    "size pushes the total past u64::MAX bytes",
                )
            })
        })
}

fn parse_entry(index: usize, raw: Value) -> Result<FileEntry, InventoryError> {
    if !raw.is_object() {
        return Err(InventoryError::malformed(index, None, "entry is not an object"));
    }
    let name = raw.get("name").and_then(Value::as_str).map(str::to_string);

    let raw: RawEntry = serde_json::from_value(raw)
        .map_err(|e| InventoryError::malformed(index, name.as_deref(), e.to_string()))?;

    FileEntry::try_from(raw).map_err(|defect| {
        InventoryError::malformed(index, defect.name.as_deref(), defect.reason)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileType, Fingerprint};

    const SAMPLE: &str = r#"{
        "files": [
            {
                "name": "backup_2023.zip",
                "size": 524288000,
                "lastModified": "2023-03-15T10:30:00Z",
                "type": "backup",
                "storageClass": "standard",
                "hash": "abc123def456"
            },
            {
                "name": "huge.mkv",
                "size": 209715200,
                "lastModified": "2024-01-01T00:00:00.500000Z",
                "hash": "large_file_209715200"
            }
        ]
    }"#;

    #[test]
    fn test_parse_sample() {
        let inventory = Inventory::from_json(SAMPLE).unwrap();
        assert_eq!(inventory.len(), 2);
        assert!(inventory.metadata.is_none());
        assert_eq!(inventory.total_size().unwrap(), 524288000 + 209715200);

        let second = &inventory.files[1];
        assert_eq!(second.file_type, FileType::Video);
        assert_eq!(second.fingerprint, Fingerprint::TooLarge(209715200));
    }

    #[test]
    fn test_missing_files_is_unsupported() {
        let err = Inventory::from_json(r#"{"entries": []}"#).unwrap_err();
        assert!(matches!(err, InventoryError::UnsupportedFormat { .. }));

        let err = Inventory::from_json(r#"{"files": {"name": "a"}}"#).unwrap_err();
        assert!(matches!(err, InventoryError::UnsupportedFormat { .. }));

        let err = Inventory::from_json("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, InventoryError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_malformed_entry_identified() {
        let json = r#"{"files": [
            {"name": "ok.txt", "size": 1, "lastModified": "2024-01-01T00:00:00Z"},
            {"name": "bad.txt", "size": 1, "lastModified": "yesterday"}
        ]}"#;
        match Inventory::from_json(json).unwrap_err() {
            InventoryError::MalformedEntry { index, name, reason } => {
                assert_eq!(index, 1);
                assert_eq!(name, "bad.txt");
                assert!(reason.contains("lastModified"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_total_size_overflow_names_entry() {
        let json = format!(
            r#"{{"files": [
                {{"name": "a.img", "size": 10, "lastModified": "2024-01-01T00:00:00Z"}},
                {{"name": "b.img", "size": {max}, "lastModified": "2024-01-01T00:00:00Z"}}
            ]}}"#,
            max = u64::MAX
        );
        let inventory = Inventory::from_json(&json).unwrap();

        match inventory.total_size().unwrap_err() {
            InventoryError::MalformedEntry { index, name, .. } => {
                assert_eq!(index, 1);
                assert_eq!(name, "b.img");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_not_json() {
        let err = Inventory::from_json("not json").unwrap_err();
        assert!(matches!(err, InventoryError::Json(_)));
    }
}
