//! Depth-first directory traversal over an explicit work stack.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use compact_str::CompactString;
use globset::GlobSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use storewise_core::{ScanConfig, ScanWarning};

/// A regular file discovered during the walk, not yet fingerprinted.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub path: PathBuf,
    pub name: CompactString,
}

/// Outcome of listing one directory.
enum DirOutcome {
    /// Files and subdirectories found in the directory.
    Listed {
        files: Vec<Candidate>,
        subdirs: Vec<PathBuf>,
        warnings: Vec<ScanWarning>,
    },
    /// The directory could not be listed; its subtree is skipped.
    Skipped(ScanWarning),
}

/// Everything the walk produced.
#[derive(Debug, Default)]
pub(crate) struct Walk {
    pub files: Vec<Candidate>,
    pub warnings: Vec<ScanWarning>,
    pub dirs_listed: u64,
    pub cancelled: bool,
}

/// Walk `root` depth-first, collecting regular files in traversal order.
///
/// Cancellation is checked before each directory is listed.
pub(crate) fn walk(
    root: &Path,
    config: &ScanConfig,
    ignore: &GlobSet,
    cancel: &CancellationToken,
) -> Walk {
    walk_with(root, config.follow_symlinks, cancel, |dir| {
        list_dir(dir, config, ignore)
    })
}

fn walk_with(
    root: &Path,
    follow_symlinks: bool,
    cancel: &CancellationToken,
    mut list: impl FnMut(&Path) -> DirOutcome,
) -> Walk {
    let mut walk = Walk::default();
    let mut stack = vec![root.to_path_buf()];

    // Only symlinked directories can form cycles.
    let mut visited: HashSet<PathBuf> = HashSet::new();
    if follow_symlinks {
        visited.insert(root.to_path_buf());
    }

    while let Some(dir) = stack.pop() {
        if cancel.is_cancelled() {
            debug!(pending = stack.len() + 1, "walk cancelled");
            walk.cancelled = true;
            break;
        }

        match list(&dir) {
            DirOutcome::Listed {
                files,
                subdirs,
                warnings,
            } => {
                walk.dirs_listed += 1;
                walk.files.extend(files);
                walk.warnings.extend(warnings);

                // Reverse so the first listed subdirectory is visited next.
                for subdir in subdirs.into_iter().rev() {
                    if follow_symlinks {
                        let canonical = fs::canonicalize(&subdir).unwrap_or_else(|_| subdir.clone());
                        if !visited.insert(canonical) {
                            debug!(path = %subdir.display(), "directory already visited");
                            continue;
                        }
                    }
                    stack.push(subdir);
                }
            }
            DirOutcome::Skipped(warning) => {
                warn!(path = %warning.path.display(), "{}", warning.message);
                walk.warnings.push(warning);
            }
        }
    }

    walk
}

fn list_dir(dir: &Path, config: &ScanConfig, ignore: &GlobSet) -> DirOutcome {
    let read_dir = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(err) => return DirOutcome::Skipped(ScanWarning::directory_list(dir, &err)),
    };

    let mut files = Vec::new();
    let mut subdirs = Vec::new();
    let mut warnings = Vec::new();

    for entry_result in read_dir {
        let entry = match entry_result {
            Ok(e) => e,
            Err(err) => {
                warn!(path = %dir.display(), error = %err, "failed to read directory entry");
                // The rest of the listing is still usable.
                warnings.push(ScanWarning::metadata(dir, &err));
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy().to_string();
        if config.should_skip_hidden(&name) || ignore.is_match(&name) {
            continue;
        }

        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(err) => {
                // Type unknown: keep it as a file so it is still inventoried.
                warnings.push(ScanWarning::metadata(&path, &err));
                files.push(Candidate {
                    path,
                    name: name.into(),
                });
                continue;
            }
        };

        if file_type.is_dir() {
            subdirs.push(path);
        } else if file_type.is_file() {
            files.push(Candidate {
                path,
                name: name.into(),
            });
        } else if file_type.is_symlink() && config.follow_symlinks {
            match fs::metadata(&path) {
                Ok(target) if target.is_dir() => subdirs.push(path),
                Ok(target) if target.is_file() => files.push(Candidate {
                    path,
                    name: name.into(),
                }),
                Ok(_) => {}
                Err(err) => {
                    debug!(path = %path.display(), error = %err, "broken symlink");
                    warnings.push(ScanWarning::metadata(&path, &err));
                }
            }
        }
    }

    DirOutcome::Listed {
        files,
        subdirs,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storewise_core::WarningKind;
    use tempfile::TempDir;

    fn names(walk: &Walk) -> Vec<String> {
        let mut names: Vec<String> = walk.files.iter().map(|c| c.name.to_string()).collect();
        names.sort();
        names
    }

    #[test]
    fn test_walk_collects_nested_files() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("a/b/c")).unwrap();
        fs::write(root.join("top.txt"), "1").unwrap();
        fs::write(root.join("a/b/c/deep.txt"), "2").unwrap();

        let config = ScanConfig::new(root);
        let walk = walk(root, &config, &GlobSet::empty(), &CancellationToken::new());

        assert_eq!(names(&walk), vec!["deep.txt", "top.txt"]);
        assert_eq!(walk.dirs_listed, 4);
        assert!(!walk.cancelled);
    }

    #[test]
    fn test_walk_skips_hidden_and_ignored() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir(root.join(".git")).unwrap();
        fs::create_dir(root.join("node_modules")).unwrap();
        fs::write(root.join(".git/config"), "x").unwrap();
        fs::write(root.join("node_modules/pkg.js"), "x").unwrap();
        fs::write(root.join(".env"), "x").unwrap();
        fs::write(root.join("keep.py"), "x").unwrap();

        let config = ScanConfig::builder()
            .root(root)
            .ignore_patterns(vec!["node_modules".to_string()])
            .build()
            .unwrap();
        let ignore = config.ignore_matcher().unwrap();
        let walk = walk(root, &config, &ignore, &CancellationToken::new());

        assert_eq!(names(&walk), vec!["keep.py"]);
    }

    #[test]
    fn test_cancelled_walk_stops_before_listing() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "x").unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let config = ScanConfig::new(temp.path());
        let walk = walk(temp.path(), &config, &GlobSet::empty(), &token);

        assert!(walk.cancelled);
        assert!(walk.files.is_empty());
    }

    #[test]
    fn test_unlistable_directory_is_skipped() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("gone");

        match list_dir(&missing, &ScanConfig::new(temp.path()), &GlobSet::empty()) {
            DirOutcome::Skipped(warning) => {
                assert_eq!(warning.kind, WarningKind::DirectoryList);
                assert_eq!(warning.path, missing);
            }
            DirOutcome::Listed { .. } => panic!("listed a missing directory"),
        }
    }

    #[test]
    fn test_vanished_subtree_does_not_stop_walk() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        for dir in ["a", "b", "c"] {
            fs::create_dir(root.join(dir)).unwrap();
            fs::write(root.join(dir).join(format!("{dir}.txt")), "x").unwrap();
        }

        let config = ScanConfig::new(root);
        let ignore = GlobSet::empty();
        // Remove `b` after the root listing queued it.
        let walk = walk_with(root, false, &CancellationToken::new(), |dir| {
            let outcome = list_dir(dir, &config, &ignore);
            if dir == root {
                fs::remove_dir_all(root.join("b")).unwrap();
            }
            outcome
        });

        assert_eq!(names(&walk), vec!["a.txt", "c.txt"]);
        assert_eq!(walk.dirs_listed, 3);
        assert_eq!(walk.warnings.len(), 1);
        assert_eq!(walk.warnings[0].kind, WarningKind::DirectoryList);
        assert_eq!(walk.warnings[0].path, root.join("b"));
    }
}
