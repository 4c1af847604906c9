//! Per-file metadata extraction and content fingerprinting.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use std::time::UNIX_EPOCH;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use storewise_core::{ContentHash, FileEntry, Fingerprint, ScanConfig, ScanWarning};

use crate::walk::Candidate;

/// Files above this size are hashed through a memory map.
const MMAP_THRESHOLD: u64 = 128 * 1024;

/// An inventoried file plus the soft failure met while describing it.
#[derive(Debug)]
pub(crate) struct Described {
    pub entry: FileEntry,
    pub warning: Option<ScanWarning>,
}

/// Stat and fingerprint one file. Never fails: problems become sentinels.
pub(crate) fn describe(candidate: &Candidate, config: &ScanConfig) -> Described {
    let metadata = match fs::metadata(&candidate.path) {
        Ok(m) => m,
        Err(err) => {
            warn!(path = %candidate.path.display(), error = %err, "cannot stat file");
            return Described {
                entry: FileEntry::new(
                    candidate.name.clone(),
                    0,
                    DateTime::<Utc>::from(UNIX_EPOCH),
                    Fingerprint::unreadable(&err),
                ),
                warning: Some(ScanWarning::metadata(&candidate.path, &err)),
            };
        }
    };

    let size = metadata.len();
    let modified = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| DateTime::<Utc>::from(UNIX_EPOCH));

    let (fingerprint, warning) = if !config.should_hash(size) {
        debug!(path = %candidate.path.display(), size, "skipping hash for large file");
        (
            Fingerprint::TooLarge(size),
            Some(ScanWarning::large_file_skipped(&candidate.path, size)),
        )
    } else {
        match hash_file(&candidate.path, size) {
            Ok(hash) => (Fingerprint::digest(hash), None),
            Err(err) => {
                warn!(path = %candidate.path.display(), error = %err, "cannot read file");
                (
                    Fingerprint::unreadable(&err),
                    Some(ScanWarning::entry_read(&candidate.path, &err)),
                )
            }
        }
    };

    Described {
        entry: FileEntry::new(candidate.name.clone(), size, modified, fingerprint),
        warning,
    }
}

/// Compute the full BLAKE3 hash of a file.
pub fn hash_file(path: &Path, size: u64) -> io::Result<ContentHash> {
    let mut hasher = blake3::Hasher::new();

    if size > MMAP_THRESHOLD {
        hasher.update_mmap(path)?;
    } else {
        let mut file = File::open(path)?;
        let mut buffer = vec![0u8; 64 * 1024];
        loop {
            let bytes_read = file.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }
    }

    Ok(ContentHash::new(*hasher.finalize().as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn candidate(path: &Path) -> Candidate {
        Candidate {
            path: path.to_path_buf(),
            name: path.file_name().unwrap().to_string_lossy().as_ref().into(),
        }
    }

    #[test]
    fn test_same_content_same_digest() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "duplicate content here").unwrap();
        fs::write(temp.path().join("b.txt"), "duplicate content here").unwrap();
        fs::write(temp.path().join("c.txt"), "unique content").unwrap();

        let config = ScanConfig::new(temp.path());
        let a = describe(&candidate(&temp.path().join("a.txt")), &config);
        let b = describe(&candidate(&temp.path().join("b.txt")), &config);
        let c = describe(&candidate(&temp.path().join("c.txt")), &config);

        assert!(a.entry.fingerprint.digest_key().is_some());
        assert_eq!(a.entry.fingerprint, b.entry.fingerprint);
        assert_ne!(a.entry.fingerprint, c.entry.fingerprint);
        assert_eq!(a.entry.size, 22);
        assert!(a.warning.is_none());
    }

    #[test]
    fn test_mmap_and_buffered_paths_agree() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("big.bin");
        let data: Vec<u8> = (0..(MMAP_THRESHOLD as usize * 2)).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &data).unwrap();

        let mapped = hash_file(&path, data.len() as u64).unwrap();
        let buffered = hash_file(&path, 0).unwrap();
        assert_eq!(mapped, buffered);
        assert_eq!(mapped.0, *blake3::hash(&data).as_bytes());
    }

    #[test]
    fn test_large_file_not_read() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("video.mp4");
        fs::write(&path, vec![0u8; 2048]).unwrap();

        let config = ScanConfig::builder()
            .root(temp.path())
            .large_file_threshold(1024u64)
            .build()
            .unwrap();
        let described = describe(&candidate(&path), &config);

        assert_eq!(described.entry.fingerprint, Fingerprint::TooLarge(2048));
        assert_eq!(described.entry.size, 2048);
        assert!(described.warning.is_some());
    }

    #[test]
    fn test_vanished_file_is_recorded() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("gone.log");

        let described = describe(&candidate(&path), &ScanConfig::new(temp.path()));

        assert_eq!(described.entry.name, "gone.log");
        assert_eq!(described.entry.size, 0);
        assert!(matches!(
            described.entry.fingerprint,
            Fingerprint::Unreadable(_)
        ));
    }
}
