//! Media directory indexing.
//!
//! One recursive walk of the media root produces both a size-to-files mapping
//! and aggregate statistics for every subdirectory.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::ignore::IgnorePolicy;
use crate::normalize_path;

/// A regular file found under the media root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub path: PathBuf,
    pub size: u64,
}

/// Aggregate statistics over a directory's full recursive subtree.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FolderStats {
    pub total_size: u64,
    pub file_count: usize,
}

/// In-memory index of a media directory, built once per run.
///
/// `BTreeMap` keeps candidate enumeration deterministic.
#[derive(Debug)]
pub struct MediaIndex {
    root: PathBuf,
    files_by_size: BTreeMap<u64, Vec<MediaFile>>,
    folder_stats: BTreeMap<PathBuf, FolderStats>,
}

impl MediaIndex {
    /// Walk the media root and index every non-ignored regular file.
    ///
    /// Each file registers under its exact byte size and accumulates into the
    /// statistics of every ancestor directory up to the root inclusive.
    /// A stat failure on an individual file skips that file without aborting
    /// the walk. Directories with no counted files are omitted.
    #[must_use]
    pub fn build(root: &Path, ignore: &IgnorePolicy) -> Self {
        let mut files_by_size: BTreeMap<u64, Vec<MediaFile>> = BTreeMap::new();
        let mut folder_stats: BTreeMap<PathBuf, FolderStats> = BTreeMap::new();

        for entry in WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(std::result::Result::ok)
        {
            if !entry.file_type().is_file() {
                continue;
            }
            if ignore.is_ignored(&crate::os_str_to_string(entry.file_name())) {
                continue;
            }
            // File vanished mid-walk: skip it, keep walking
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            let size = metadata.len();
            let path = entry.path().to_path_buf();

            for ancestor in path.ancestors().skip(1) {
                let stats = folder_stats.entry(ancestor.to_path_buf()).or_default();
                stats.total_size += size;
                stats.file_count += 1;
                if ancestor == root {
                    break;
                }
            }

            files_by_size.entry(size).or_default().push(MediaFile { path, size });
        }

        Self {
            root: root.to_path_buf(),
            files_by_size,
            folder_stats,
        }
    }

    /// The indexed media root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All indexed files with exactly the given size, in walk order.
    #[must_use]
    pub fn files_of_size(&self, size: u64) -> &[MediaFile] {
        self.files_by_size.get(&size).map_or(&[], Vec::as_slice)
    }

    /// All indexed files whose size is within `tolerance` bytes of `target`, in size order.
    pub fn files_of_size_within(&self, target: u64, tolerance: u64) -> impl Iterator<Item = &MediaFile> {
        self.files_by_size
            .range(target.saturating_sub(tolerance)..=target.saturating_add(tolerance))
            .flat_map(|(_, files)| files.iter())
    }

    /// Directory statistics, keyed by absolute directory path.
    #[must_use]
    pub fn folder_stats(&self) -> &BTreeMap<PathBuf, FolderStats> {
        &self.folder_stats
    }

    /// Normalized paths of all indexed files, relative to the media root.
    #[must_use]
    pub fn relative_paths(&self) -> BTreeSet<PathBuf> {
        self.files_by_size
            .values()
            .flatten()
            .filter_map(|file| file.path.strip_prefix(&self.root).ok())
            .map(normalize_path)
            .collect()
    }

    /// Total number of indexed files.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files_by_size.values().map(Vec::len).sum()
    }

    /// Combined byte size of all indexed files.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.files_by_size
            .iter()
            .map(|(size, files)| size * files.len() as u64)
            .sum()
    }
}
