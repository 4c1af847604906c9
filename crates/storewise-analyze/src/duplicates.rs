//! Duplicate grouping over content fingerprints.
//!
//! Only digest fingerprints take part. Sentinels (`large_file_*`,
//! `error_*`) and missing fingerprints never match anything, not even an
//! identical sentinel, so files that were never read can't be proposed
//! for deletion.

use compact_str::CompactString;
use indexmap::IndexMap;
use serde::Serialize;

use storewise_core::{FileEntry, InventoryError};

/// A set of entries sharing one content digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateGroup {
    /// Digest shared by all members.
    pub digest: CompactString,

    /// Indices of the members in the analyzed slice, ascending.
    pub members: Vec<usize>,

    /// Index of the member to keep.
    pub canonical: usize,

    /// Bytes freed by deleting every member but the canonical one.
    pub wasted_bytes: u64,
}

impl DuplicateGroup {
    /// Members other than the canonical one.
    pub fn deletable(&self) -> impl Iterator<Item = usize> + '_ {
        self.members.iter().copied().filter(|&i| i != self.canonical)
    }
}

/// Partition `entries` by digest and keep the groups with two or more members.
///
/// Groups come out sorted by wasted bytes, largest first, then by the
/// position of their first member. Fails on the member whose size pushes
/// a group's wasted bytes past `u64::MAX`.
pub fn find_duplicates(entries: &[FileEntry]) -> Result<Vec<DuplicateGroup>, InventoryError> {
    let mut by_digest: IndexMap<&str, Vec<usize>> = IndexMap::new();
    for (index, entry) in entries.iter().enumerate() {
        if let Some(digest) = entry.fingerprint.digest_key() {
            by_digest.entry(digest).or_default().push(index);
        }
    }

    let mut groups: Vec<DuplicateGroup> = by_digest
        .into_iter()
        .filter(|(_, members)| members.len() >= 2)
        .map(|(digest, members)| -> Result<DuplicateGroup, InventoryError> {
            let canonical = pick_canonical(entries, &members);
            let wasted_bytes = wasted_bytes(entries, &members, canonical)?;
            Ok(DuplicateGroup {
                digest: digest.into(),
                members,
                canonical,
                wasted_bytes,
            })
        })
        .collect::<Result<_, _>>()?;

    groups.sort_by(|a, b| {
        b.wasted_bytes
            .cmp(&a.wasted_bytes)
            .then_with(|| a.members[0].cmp(&b.members[0]))
    });
    Ok(groups)
}

fn wasted_bytes(
    entries: &[FileEntry],
    members: &[usize],
    canonical: usize,
) -> Result<u64, InventoryError> {
    members
        .iter()
        .filter(|&&i| i != canonical)
        .try_fold(0u64, |total, &i| {
            let entry = &entries[i];
            total.checked_add(entry.size).ok_or_else(|| {
                InventoryError::malformed(
                    i,
                    Some(entry.name.as_str()),
                    "duplicate sizes sum past u64::MAX bytes",
                )
            })
        })
}

/// Earliest modification wins, then the smallest name, then input position.
fn pick_canonical(entries: &[FileEntry], members: &[usize]) -> usize {
    members
        .iter()
        .copied()
        .min_by(|&a, &b| {
            let (ea, eb) = (&entries[a], &entries[b]);
            ea.last_modified
                .cmp(&eb.last_modified)
                .then_with(|| ea.name.cmp(&eb.name))
                .then_with(|| a.cmp(&b))
        })
        .unwrap_or(members[0])
}
