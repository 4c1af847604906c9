//! Inventory entry types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumString};

use crate::file_type::FileType;

/// Maximum number of characters of an error message kept in an
/// [`Fingerprint::Unreadable`] sentinel.
pub const MAX_ERROR_DETAIL: usize = 40;

const TOO_LARGE_PREFIX: &str = "large_file_";
const UNREADABLE_PREFIX: &str = "error_";

/// BLAKE3 content hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the hash as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// Content fingerprint of a file, or the reason there is none.
///
/// Only [`Fingerprint::Digest`] is an equality key. The other variants are
/// sentinels and never match anything, themselves included.
///
/// On the wire a fingerprint is a single string: the digest itself,
/// `large_file_<size>` or `error_<reason>`. A missing value is `Absent`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Fingerprint {
    /// Content digest (hex for locally computed hashes, opaque otherwise).
    Digest(CompactString),
    /// Hashing was skipped because the file exceeds the size threshold.
    TooLarge(u64),
    /// The file could not be read; carries a truncated error message.
    Unreadable(CompactString),
    /// No fingerprint was supplied.
    #[default]
    Absent,
}

impl Fingerprint {
    /// Fingerprint from a locally computed content hash.
    pub fn digest(hash: ContentHash) -> Self {
        Self::Digest(hash.to_hex().into())
    }

    /// Sentinel for a read failure, truncating the message.
    pub fn unreadable(reason: impl fmt::Display) -> Self {
        let reason: CompactString = reason.to_string().chars().take(MAX_ERROR_DETAIL).collect();
        Self::Unreadable(reason)
    }

    /// The digest usable for equality testing, if any.
    pub fn digest_key(&self) -> Option<&str> {
        match self {
            Self::Digest(d) => Some(d.as_str()),
            _ => None,
        }
    }

    /// Whether this is a sentinel rather than a digest.
    pub fn is_sentinel(&self) -> bool {
        !matches!(self, Self::Digest(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Digest(d) => f.write_str(d),
            Self::TooLarge(size) => write!(f, "{TOO_LARGE_PREFIX}{size}"),
            Self::Unreadable(reason) => write!(f, "{UNREADABLE_PREFIX}{reason}"),
            Self::Absent => Ok(()),
        }
    }
}

impl FromStr for Fingerprint {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::Absent);
        }
        if let Some(size) = s.strip_prefix(TOO_LARGE_PREFIX) {
            // A malformed size still marks a sentinel, never a digest.
            return Ok(match size.parse() {
                Ok(size) => Self::TooLarge(size),
                Err(_) => Self::Unreadable(s.into()),
            });
        }
        if let Some(reason) = s.strip_prefix(UNREADABLE_PREFIX) {
            return Ok(Self::Unreadable(reason.into()));
        }
        Ok(Self::Digest(s.into()))
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Absent => serializer.serialize_none(),
            other => serializer.collect_str(other),
        }
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(match raw {
            Some(s) => s.parse().unwrap_or_default(),
            None => Self::Absent,
        })
    }
}

/// Storage tier a file currently lives in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StorageClass {
    #[default]
    Standard,
    #[serde(alias = "glacier", alias = "cold")]
    #[strum(to_string = "archive", serialize = "glacier", serialize = "cold")]
    Archive,
}

/// One physical file in an inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawEntry")]
pub struct FileEntry {
    /// Display name (not full path).
    pub name: CompactString,

    /// Size in bytes.
    pub size: u64,

    /// Last content modification time.
    pub last_modified: DateTime<Utc>,

    /// Category derived from the extension.
    #[serde(rename = "type")]
    pub file_type: FileType,

    /// Current storage tier.
    pub storage_class: StorageClass,

    /// Content fingerprint or sentinel.
    #[serde(rename = "hash", skip_serializing_if = "Fingerprint::is_absent")]
    pub fingerprint: Fingerprint,
}

impl FileEntry {
    /// Create an entry, classifying its type from the name.
    pub fn new(
        name: impl Into<CompactString>,
        size: u64,
        last_modified: DateTime<Utc>,
        fingerprint: Fingerprint,
    ) -> Self {
        let name = name.into();
        Self {
            file_type: FileType::from_name(&name),
            name,
            size,
            last_modified,
            storage_class: StorageClass::Standard,
            fingerprint,
        }
    }

    /// Check that the entry can be analyzed.
    pub fn validate(&self) -> Result<(), EntryDefect> {
        if self.name.trim().is_empty() {
            return Err(EntryDefect::new("name is empty"));
        }
        Ok(())
    }
}

/// Why a single entry could not be accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDefect {
    /// Entry name, if one could be read.
    pub name: Option<String>,
    /// Human-readable reason.
    pub reason: String,
}

impl EntryDefect {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            name: None,
            reason: reason.into(),
        }
    }

    fn named(name: &str, reason: impl Into<String>) -> Self {
        Self {
            name: Some(name.to_string()),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for EntryDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Loosely typed entry as found in an inventory payload.
///
/// Every field is optional here so that bad values are reported with the
/// entry they belong to instead of as a generic parse failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    size: Option<serde_json::Value>,
    #[serde(default)]
    last_modified: Option<serde_json::Value>,
    #[serde(default, rename = "type")]
    file_type: Option<String>,
    #[serde(default)]
    storage_class: Option<String>,
    #[serde(default)]
    hash: Fingerprint,
}

impl TryFrom<RawEntry> for FileEntry {
    type Error = EntryDefect;

    fn try_from(raw: RawEntry) -> Result<Self, Self::Error> {
        let name = match raw.name.as_deref() {
            Some(n) if !n.trim().is_empty() => n,
            _ => return Err(EntryDefect::new("name is missing or empty")),
        };

        let size = match &raw.size {
            None => return Err(EntryDefect::named(name, "size is missing")),
            Some(value) => match value.as_u64() {
                Some(size) => size,
                None if value.as_i64().is_some_and(|s| s < 0) => {
                    return Err(EntryDefect::named(name, format!("negative size {value}")));
                }
                None => {
                    return Err(EntryDefect::named(
                        name,
                        format!("size {value} is not a non-negative integer"),
                    ));
                }
            },
        };

        let last_modified = match &raw.last_modified {
            None => return Err(EntryDefect::named(name, "lastModified is missing")),
            Some(serde_json::Value::String(s)) => parse_timestamp(s).ok_or_else(|| {
                EntryDefect::named(name, format!("unparseable lastModified {s:?}"))
            })?,
            Some(other) => {
                return Err(EntryDefect::named(
                    name,
                    format!("lastModified {other} is not an ISO-8601 string"),
                ));
            }
        };

        // Unknown or missing types fall back to the extension lookup.
        let file_type = raw
            .file_type
            .as_deref()
            .and_then(|t| t.parse().ok())
            .unwrap_or_else(|| FileType::from_name(name));

        let storage_class = match raw.storage_class.as_deref() {
            None => StorageClass::Standard,
            Some(class) => class.parse().map_err(|_| {
                EntryDefect::named(name, format!("unknown storageClass {class:?}"))
            })?,
        };

        Ok(Self {
            name: name.into(),
            size,
            last_modified,
            file_type,
            storage_class,
            fingerprint: raw.hash,
        })
    }
}

/// Parse an ISO-8601 timestamp, normalizing to UTC.
///
/// Accepts RFC 3339 with any offset, naive date-times (taken as UTC) and
/// bare dates (midnight UTC).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
