//! Analysis result types: per-entry annotations and the batch summary.

use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;
use strum::{Display, EnumIter, IntoStaticStr};

use storewise_core::{FileEntry, FileType, InventoryError};

/// What to do with one file.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Display, EnumIter, IntoStaticStr,
)]
pub enum Recommendation {
    #[default]
    #[serde(rename = "Keep")]
    #[strum(to_string = "Keep")]
    Keep,

    #[serde(rename = "Move to Glacier/Cold storage")]
    #[strum(to_string = "Move to Glacier/Cold storage")]
    Archive,

    #[serde(rename = "Delete Duplicate")]
    #[strum(to_string = "Delete Duplicate")]
    DeleteDuplicate,
}

/// Derived verdict for one entry. Never alters the entry itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub is_old: bool,
    pub is_duplicate: bool,
    /// Keeper of its duplicate group.
    pub is_canonical: bool,
    pub recommendation: Recommendation,
    /// Estimated monthly saving in dollars.
    pub savings_per_month: f64,
    /// Bytes freed by acting on the recommendation.
    pub space_savings: u64,
}

/// An entry together with its annotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedEntry {
    #[serde(flatten)]
    pub entry: FileEntry,
    pub analysis: Annotation,
}

/// Count and bytes for one file type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TypeStats {
    pub count: u64,
    pub bytes: u64,
}

/// Aggregate over one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub total_files: u64,
    pub total_size: u64,
    /// Entries recommended for archiving.
    pub old_files: u64,
    /// Entries belonging to any duplicate group, canonical members included.
    pub duplicates: u64,
    pub duplicate_groups: u64,
    /// Bytes freed by deleting every non-canonical duplicate.
    pub space_savings: u64,
    /// Sum of per-entry monthly savings.
    pub estimated_savings: f64,
    /// Per-type breakdown in [`FileType`] declaration order.
    pub by_type: IndexMap<FileType, TypeStats>,
}

impl AnalysisSummary {
    /// Reduce annotated entries into a summary.
    ///
    /// Fails on the entry whose size pushes the total past `u64::MAX`.
    pub fn from_entries(
        files: &[AnnotatedEntry],
        duplicate_groups: u64,
    ) -> Result<Self, InventoryError> {
        let mut summary = Self {
            duplicate_groups,
            ..Self::default()
        };

        for (index, file) in files.iter().enumerate() {
            let a = &file.analysis;
            summary.total_files += 1;
            let overflow = || {
                InventoryError::malformed(
                    index,
                    Some(file.entry.name.as_str()),
                    "size pushes the total past u64::MAX bytes",
                )
            };
            summary.total_size = summary
                .total_size
                .checked_add(file.entry.size)
                .ok_or_else(overflow)?;
            if a.recommendation == Recommendation::Archive {
                summary.old_files += 1;
            }
            if a.is_duplicate {
                summary.duplicates += 1;
            }
            summary.space_savings = summary
                .space_savings
                .checked_add(a.space_savings)
                .ok_or_else(overflow)?;
            summary.estimated_savings += a.savings_per_month;

            let stats = summary.by_type.entry(file.entry.file_type).or_default();
            stats.count += 1;
            // Bounded by the checked total.
            stats.bytes += file.entry.size;
        }

        summary.by_type.sort_keys();
        Ok(summary)
    }
}

/// Result of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub summary: AnalysisSummary,
    /// Annotated entries, in input order.
    pub files: Vec<AnnotatedEntry>,
}

impl AnalysisReport {
    /// Entries with the highest monthly savings, largest first.
    ///
    /// Entries with no saving are left out.
    pub fn top_savings(&self, n: usize) -> Vec<&AnnotatedEntry> {
        self.files
            .iter()
            .filter(|f| f.analysis.savings_per_month > 0.0)
            .sorted_by(|a, b| {
                b.analysis
                    .savings_per_month
                    .total_cmp(&a.analysis.savings_per_month)
            })
            .take(n)
            .collect()
    }

    /// Largest entries by size, largest first.
    pub fn largest_files(&self, n: usize) -> Vec<&AnnotatedEntry> {
        self.files
            .iter()
            .sorted_by(|a, b| b.entry.size.cmp(&a.entry.size))
            .take(n)
            .collect()
    }

    /// Entries with a given recommendation, in input order.
    pub fn with_recommendation(
        &self,
        recommendation: Recommendation,
    ) -> impl Iterator<Item = &AnnotatedEntry> {
        self.files
            .iter()
            .filter(move |f| f.analysis.recommendation == recommendation)
    }

    /// Serialize as pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, InventoryError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
