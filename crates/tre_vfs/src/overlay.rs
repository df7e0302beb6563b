//! A priority-merged view over a stack of TRE archives.

use dashmap::{mapref::entry::Entry as Slot, DashMap};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::{
    error::{Error, Result},
    read::{TreeArchive, TreeEntry},
};

/// One archive that could not be merged. The rest of the stack is unaffected.
#[derive(Debug)]
pub struct MergeFailure {
    /// The archive that failed to parse
    pub archive: PathBuf,
    /// Why it failed
    pub error: Error,
}

/// A name-to-entry map assembled from a ranked stack of archives.
///
/// Rank 0 is the highest priority. When several archives define the same
/// path, the copy from the lowest-ranked archive stays visible; an exact rank
/// tie falls back to the lexically smaller archive path, so a merge always
/// produces the same view no matter what order the archives finish parsing
/// in. Feeding archives to [`TreeOverlay::add`] in rank order therefore
/// behaves as first-insert-wins: load newest to oldest.
///
/// The overlay is an ordinary owned value, safe to populate from several
/// threads at once and to query while population is still in progress.
#[derive(Debug, Default)]
pub struct TreeOverlay {
    entries: DashMap<String, RankedEntry>,
}

#[derive(Debug)]
struct RankedEntry {
    rank: usize,
    entry: TreeEntry,
}

impl TreeOverlay {
    /// Create an empty overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `entry` under its name at the given rank.
    ///
    /// Returns `true` when the entry became the visible one for its path. An
    /// entry already held at a better rank is never displaced; the comparison
    /// and insert happen under the map's per-key lock, so concurrent callers
    /// cannot interleave between them.
    pub fn add(&self, rank: usize, entry: TreeEntry) -> bool {
        match self.entries.entry(entry.name.clone()) {
            Slot::Vacant(slot) => {
                slot.insert(RankedEntry { rank, entry });
                true
            }
            Slot::Occupied(mut slot) => {
                let held = slot.get();
                let wins = rank < held.rank
                    || (rank == held.rank && entry.archive_path() < held.entry.archive_path());
                if wins {
                    slot.insert(RankedEntry { rank, entry });
                }
                wins
            }
        }
    }

    /// Parse the archive at `path` and add every entry it contains at `rank`.
    ///
    /// Returns the number of entries that became visible. A parse failure
    /// abandons this archive only; nothing is added from it.
    pub fn merge_archive(&self, rank: usize, path: impl AsRef<Path>) -> Result<usize> {
        let archive = TreeArchive::open(path.as_ref())?;

        let total = archive.len();
        let mut added = 0;
        for entry in archive.into_entries() {
            if self.add(rank, entry) {
                added += 1;
            }
        }

        debug!(path = %path.as_ref().display(), rank, added, total, "merged archive");
        Ok(added)
    }

    /// Merge a stack of archives ranked by position, first = highest
    /// priority.
    ///
    /// Archives are parsed in parallel; the rank attached to every entry
    /// keeps the outcome independent of scheduling. An archive that fails to
    /// parse is reported in the returned list and skipped, never fatal to
    /// the others.
    pub fn merge_all<P: AsRef<Path> + Sync>(&self, archives: &[P]) -> Vec<MergeFailure> {
        archives
            .par_iter()
            .enumerate()
            .filter_map(|(rank, path)| match self.merge_archive(rank, path) {
                Ok(_) => None,
                Err(error) => {
                    warn!(path = %path.as_ref().display(), %error, "skipping archive");
                    Some(MergeFailure {
                        archive: path.as_ref().to_path_buf(),
                        error,
                    })
                }
            })
            .collect()
    }

    /// Look up the visible entry for `name`.
    pub fn get(&self, name: &str) -> Option<TreeEntry> {
        self.entries.get(name).map(|held| held.entry.clone())
    }

    /// Whether any archive in the stack defines `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Resolve `name` and extract its data in one step.
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        let entry = self
            .get(name)
            .ok_or_else(|| Error::EntryNotFound(name.to_owned()))?;
        entry.read_bytes()
    }

    /// Number of distinct paths visible in the overlay.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the overlay holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every visible path that starts with `prefix`.
    ///
    /// A full scan of the map; no directory tree is maintained and the order
    /// is unspecified.
    pub fn list_by_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = String> + 'a {
        self.entries
            .iter()
            .filter(move |held| held.key().starts_with(prefix))
            .map(|held| held.key().clone())
    }

    /// Every visible path in the overlay, in unspecified order.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|held| held.key().clone()).collect()
    }
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::TreeOverlay;
    use crate::read::TreeEntry;

    fn entry(name: &str, archive: &str, data_offset: u32) -> TreeEntry {
        TreeEntry {
            name: name.to_owned(),
            checksum: 0,
            md5: [0; 16],
            compression_level: 0,
            deflated_size: 0,
            inflated_size: 0,
            data_offset,
            archive_path: Arc::new(PathBuf::from(archive)),
        }
    }

    #[test]
    fn first_insert_wins_at_equal_priority() {
        let overlay = TreeOverlay::new();

        assert!(overlay.add(0, entry("x/y.iff", "a.tre", 1)));
        assert!(!overlay.add(0, entry("x/y.iff", "a.tre", 2)));

        assert_eq!(overlay.get("x/y.iff").unwrap().data_offset, 1);
        assert_eq!(overlay.len(), 1);
    }

    #[test]
    fn lower_rank_wins_regardless_of_arrival_order() {
        let overlay = TreeOverlay::new();

        overlay.add(1, entry("x/y.iff", "old.tre", 1));
        assert!(overlay.add(0, entry("x/y.iff", "new.tre", 2)));

        let held = overlay.get("x/y.iff").unwrap();
        assert_eq!(held.archive_path(), std::path::Path::new("new.tre"));
    }

    #[test]
    fn higher_rank_never_displaces() {
        let overlay = TreeOverlay::new();

        overlay.add(0, entry("x/y.iff", "new.tre", 1));
        assert!(!overlay.add(1, entry("x/y.iff", "old.tre", 2)));

        let held = overlay.get("x/y.iff").unwrap();
        assert_eq!(held.archive_path(), std::path::Path::new("new.tre"));
    }

    #[test]
    fn equal_rank_ties_break_on_archive_path() {
        let overlay = TreeOverlay::new();

        overlay.add(0, entry("x/y.iff", "b.tre", 1));
        assert!(overlay.add(0, entry("x/y.iff", "a.tre", 2)));

        let held = overlay.get("x/y.iff").unwrap();
        assert_eq!(held.archive_path(), std::path::Path::new("a.tre"));
    }

    #[test]
    fn list_by_prefix_is_a_literal_prefix_match() {
        let overlay = TreeOverlay::new();
        overlay.add(0, entry("a/one.iff", "a.tre", 0));
        overlay.add(0, entry("a/two.iff", "a.tre", 0));
        overlay.add(0, entry("ab/three.iff", "a.tre", 0));
        overlay.add(0, entry("b/four.iff", "a.tre", 0));

        let mut names: Vec<_> = overlay.list_by_prefix("a/").collect();
        names.sort();
        assert_eq!(names, vec!["a/one.iff", "a/two.iff"]);

        // Restartable: a second scan sees the same set.
        assert_eq!(overlay.list_by_prefix("a/").count(), 2);
        assert_eq!(overlay.list_by_prefix("").count(), 4);
    }

    #[test]
    fn get_missing_name() {
        let overlay = TreeOverlay::new();
        assert!(overlay.get("missing.iff").is_none());
        assert!(!overlay.contains("missing.iff"));
        assert!(overlay.is_empty());
    }
}
