//! Scan configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Files larger than this are not fingerprinted (100 MiB).
pub const DEFAULT_LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Number of files between two progress reports.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 50;

/// Configuration for scanning operations.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Root path to scan.
    pub root: PathBuf,

    /// Follow symbolic links.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Include hidden files and directories (starting with .).
    #[builder(default = "false")]
    #[serde(default)]
    pub include_hidden: bool,

    /// Glob patterns matched against entry names; matches are skipped.
    #[builder(default)]
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Number of fingerprinting threads (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Files strictly larger than this are not read for fingerprinting.
    #[builder(default = "DEFAULT_LARGE_FILE_THRESHOLD")]
    #[serde(default = "default_large_file_threshold")]
    pub large_file_threshold: u64,

    /// Emit a progress snapshot every this many files.
    #[builder(default = "DEFAULT_PROGRESS_INTERVAL")]
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,
}

fn default_large_file_threshold() -> u64 {
    DEFAULT_LARGE_FILE_THRESHOLD
}

fn default_progress_interval() -> u64 {
    DEFAULT_PROGRESS_INTERVAL
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.root {
            Some(ref root) if root.as_os_str().is_empty() => {
                return Err("Root path cannot be empty".to_string());
            }
            Some(_) => {}
            None => return Err("Root path is required".to_string()),
        }
        if self.progress_interval == Some(0) {
            return Err("Progress interval must be at least 1".to_string());
        }
        if let Some(ref patterns) = self.ignore_patterns {
            compile_patterns(patterns)?;
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a simple config for scanning a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            follow_symlinks: false,
            include_hidden: false,
            ignore_patterns: Vec::new(),
            threads: 0,
            large_file_threshold: DEFAULT_LARGE_FILE_THRESHOLD,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    /// Compile the ignore patterns into a matcher.
    pub fn ignore_matcher(&self) -> Result<GlobSet, ScanError> {
        compile_patterns(&self.ignore_patterns).map_err(|message| ScanError::InvalidConfig { message })
    }

    /// Check if hidden entries should be skipped.
    pub fn should_skip_hidden(&self, name: &str) -> bool {
        !self.include_hidden && name.starts_with('.')
    }

    /// Check if a file of this size is fingerprinted.
    pub fn should_hash(&self, size: u64) -> bool {
        size <= self.large_file_threshold
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

fn compile_patterns(patterns: &[String]) -> Result<GlobSet, String> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| format!("Invalid ignore pattern {pattern:?}: {e}"))?;
        builder.add(glob);
    }
    builder.build().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ScanConfig::builder()
            .root("/home/user")
            .threads(4usize)
            .large_file_threshold(1024u64)
            .build()
            .unwrap();

        assert_eq!(config.root, PathBuf::from("/home/user"));
        assert_eq!(config.threads, 4);
        assert_eq!(config.large_file_threshold, 1024);
        assert!(!config.include_hidden);
        assert_eq!(config.progress_interval, DEFAULT_PROGRESS_INTERVAL);
    }

    #[test]
    fn test_config_simple() {
        let config = ScanConfig::new("/home/user");
        assert_eq!(config.root, PathBuf::from("/home/user"));
        assert_eq!(config.large_file_threshold, 100 * 1024 * 1024);
        assert!(!config.follow_symlinks);
    }

    #[test]
    fn test_builder_rejects_bad_input() {
        assert!(ScanConfig::builder().build().is_err());
        assert!(ScanConfig::builder().root("").build().is_err());
        assert!(
            ScanConfig::builder()
                .root("/test")
                .ignore_patterns(vec!["[".to_string()])
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_ignore_matcher() {
        let config = ScanConfig::builder()
            .root("/test")
            .ignore_patterns(vec!["node_modules".to_string(), "*.tmp".to_string()])
            .build()
            .unwrap();
        let matcher = config.ignore_matcher().unwrap();

        assert!(matcher.is_match("node_modules"));
        assert!(matcher.is_match("scratch.tmp"));
        assert!(!matcher.is_match("src"));
    }

    #[test]
    fn test_should_skip_hidden() {
        let mut config = ScanConfig::new("/test");

        // Hidden entries are skipped by default
        assert!(config.should_skip_hidden(".git"));
        assert!(!config.should_skip_hidden("src"));

        config.include_hidden = true;
        assert!(!config.should_skip_hidden(".git"));
    }

    #[test]
    fn test_should_hash_boundary() {
        let config = ScanConfig::builder()
            .root("/test")
            .large_file_threshold(10u64)
            .build()
            .unwrap();
        assert!(config.should_hash(10));
        assert!(!config.should_hash(11));
    }
}
