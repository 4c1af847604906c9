//! The analysis engine: one pass over a materialized inventory.

use chrono::{DateTime, Utc};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use storewise_core::{FileEntry, Inventory, InventoryError, sum_sizes};

use crate::age::{DEFAULT_STALE_AFTER_MONTHS, StalenessRule, stale_cutoff};
use crate::duplicates::find_duplicates;
use crate::pricing::{PricingModel, TieredPricing};
use crate::report::{AnalysisReport, AnalysisSummary, AnnotatedEntry, Annotation, Recommendation};

/// Configuration for an analysis run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(rename_all = "camelCase")]
pub struct AnalysisConfig {
    /// The single "now" every entry is judged against (default: now).
    #[builder(default = "Utc::now()")]
    pub reference_time: DateTime<Utc>,

    /// Files modified this many calendar months before `reference_time`,
    /// or earlier, are old.
    #[builder(default = "DEFAULT_STALE_AFTER_MONTHS")]
    pub stale_after_months: u32,
}

impl AnalysisConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        let reference = self.reference_time.unwrap_or_else(Utc::now);
        let months = self.stale_after_months.unwrap_or(DEFAULT_STALE_AFTER_MONTHS);
        if stale_cutoff(reference, months).is_none() {
            return Err(format!("{months} months before {reference} is out of range"));
        }
        Ok(())
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            reference_time: Utc::now(),
            stale_after_months: DEFAULT_STALE_AFTER_MONTHS,
        }
    }
}

impl AnalysisConfig {
    /// Create a new config builder.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Default config judged against a fixed instant.
    pub fn at(reference_time: DateTime<Utc>) -> Self {
        Self {
            reference_time,
            ..Self::default()
        }
    }
}

/// Annotates entries and summarizes them.
///
/// Holds no state between runs: the same input and config always give the
/// same report.
#[derive(Debug, Clone, Default)]
pub struct Analyzer<P = TieredPricing> {
    config: AnalysisConfig,
    pricing: P,
}

impl Analyzer {
    /// Create an analyzer with default config and pricing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an analyzer with custom config and default pricing.
    pub fn with_config(config: AnalysisConfig) -> Self {
        Self {
            config,
            pricing: TieredPricing::default(),
        }
    }
}

impl<P: PricingModel> Analyzer<P> {
    /// Create an analyzer with a custom pricing model.
    pub fn with_pricing(config: AnalysisConfig, pricing: P) -> Self {
        Self { config, pricing }
    }

    /// The config used for every run.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze the entries of an inventory.
    pub fn analyze_inventory(&self, inventory: &Inventory) -> Result<AnalysisReport, InventoryError> {
        self.analyze(&inventory.files)
    }

    /// Annotate every entry and build the summary.
    ///
    /// Fails without a partial report if any entry cannot be analyzed.
    pub fn analyze(&self, entries: &[FileEntry]) -> Result<AnalysisReport, InventoryError> {
        for (index, entry) in entries.iter().enumerate() {
            entry.validate().map_err(|defect| {
                InventoryError::malformed(index, defect.name.as_deref(), defect.reason)
            })?;
        }

        // Every byte total below is bounded by this one.
        sum_sizes(entries)?;

        let staleness =
            StalenessRule::new(self.config.reference_time, self.config.stale_after_months);
        let groups = find_duplicates(entries)?;
        debug!(
            entries = entries.len(),
            groups = groups.len(),
            cutoff = ?staleness.cutoff(),
            "analyzing"
        );

        // Per-entry duplicate role: None, Some(true) for keepers, Some(false) otherwise.
        let mut role: Vec<Option<bool>> = vec![None; entries.len()];
        for group in &groups {
            for member in group.deletable() {
                role[member] = Some(false);
            }
            role[group.canonical] = Some(true);
        }

        let files: Vec<AnnotatedEntry> = entries
            .iter()
            .zip(role)
            .map(|(entry, role)| AnnotatedEntry {
                entry: entry.clone(),
                analysis: self.annotate(entry, staleness.is_old(entry), role),
            })
            .collect();

        let summary = AnalysisSummary::from_entries(&files, groups.len() as u64)?;
        debug!(
            old = summary.old_files,
            duplicates = summary.duplicates,
            savings = summary.estimated_savings,
            "analysis finished"
        );

        Ok(AnalysisReport { summary, files })
    }

    fn annotate(&self, entry: &FileEntry, is_old: bool, role: Option<bool>) -> Annotation {
        let is_duplicate = role.is_some();
        let is_canonical = role == Some(true);

        // Deletion wins over archiving for old non-canonical copies.
        let recommendation = if is_duplicate && !is_canonical {
            Recommendation::DeleteDuplicate
        } else if is_old {
            Recommendation::Archive
        } else {
            Recommendation::Keep
        };

        let (savings_per_month, space_savings) = match recommendation {
            Recommendation::Keep => (0.0, 0),
            Recommendation::Archive => (self.pricing.archive_savings(entry.size), 0),
            Recommendation::DeleteDuplicate => {
                (self.pricing.deletion_savings(entry.size), entry.size)
            }
        };

        Annotation {
            is_old,
            is_duplicate,
            is_canonical,
            recommendation,
            savings_per_month,
            space_savings,
        }
    }
}
