//! Analysis engine for storewise.
//!
//! Takes a flat list of [`FileEntry`] records, from a local scan or an
//! inventory file, and produces a per-entry verdict plus a summary:
//!
//! - **Duplicate grouping** - entries sharing a content digest; one
//!   canonical member per group is kept
//! - **Staleness** - entries not modified for a number of calendar months
//! - **Savings** - monthly cost freed by deleting or archiving, through an
//!   injectable [`PricingModel`]
//!
//! Every entry is judged against the single reference time held in
//! [`AnalysisConfig`], so a run is a pure function of its input.
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use storewise_analyze::{AnalysisConfig, Analyzer, Recommendation};
//! use storewise_core::{FileEntry, Fingerprint};
//!
//! let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
//! let old = Utc.with_ymd_and_hms(2022, 8, 20, 0, 0, 0).unwrap();
//! let entries = vec![FileEntry::new("app.log", 1024, old, Fingerprint::Absent)];
//!
//! let report = Analyzer::with_config(AnalysisConfig::at(now))
//!     .analyze(&entries)
//!     .unwrap();
//!
//! assert_eq!(report.files[0].analysis.recommendation, Recommendation::Archive);
//! assert_eq!(report.summary.old_files, 1);
//! ```

pub mod age;
mod analyzer;
mod duplicates;
mod pricing;
mod report;

pub use age::{DEFAULT_STALE_AFTER_MONTHS, StalenessRule};
pub use analyzer::{AnalysisConfig, AnalysisConfigBuilder, Analyzer};
pub use duplicates::{DuplicateGroup, find_duplicates};
pub use pricing::{
    BYTES_PER_GIB, DEFAULT_ARCHIVE_PRICE, DEFAULT_STANDARD_PRICE, PricingModel, TieredPricing,
    TieredPricingBuilder,
};
pub use report::{
    AnalysisReport, AnalysisSummary, AnnotatedEntry, Annotation, Recommendation, TypeStats,
};

// Re-export core types
pub use storewise_core::{FileEntry, FileType, Inventory, InventoryError, StorageClass};
