//! Staleness classification with calendar month arithmetic.

use chrono::{DateTime, Months, Utc};

use storewise_core::FileEntry;

/// Default number of months after which a file counts as old.
pub const DEFAULT_STALE_AFTER_MONTHS: u32 = 6;

/// Decides whether entries are old relative to one fixed instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalenessRule {
    cutoff: Option<DateTime<Utc>>,
}

impl StalenessRule {
    /// Entries modified at or before `reference - months` are old.
    ///
    /// A cutoff that falls before the representable range marks nothing
    /// as old.
    pub fn new(reference: DateTime<Utc>, months: u32) -> Self {
        Self {
            cutoff: stale_cutoff(reference, months),
        }
    }

    /// The instant at or before which entries are old.
    pub fn cutoff(&self) -> Option<DateTime<Utc>> {
        self.cutoff
    }

    /// Check one modification time.
    pub fn is_old_at(&self, last_modified: DateTime<Utc>) -> bool {
        self.cutoff.is_some_and(|cutoff| last_modified <= cutoff)
    }

    /// Check one entry.
    pub fn is_old(&self, entry: &FileEntry) -> bool {
        self.is_old_at(entry.last_modified)
    }
}

/// `reference` minus `months` calendar months, clamped to month ends.
pub fn stale_cutoff(reference: DateTime<Utc>, months: u32) -> Option<DateTime<Utc>> {
    reference.checked_sub_months(Months::new(months))
}
