//! Size-based matching of torrent manifests to media candidates.

use std::path::PathBuf;

use crate::index::{MediaFile, MediaIndex};
use crate::torrent::Manifest;

/// A media location whose size is consistent with a torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    /// A single media file, candidate for a one-entry torrent.
    File(MediaFile),
    /// A media folder, candidate for a multi-file torrent.
    Folder(PathBuf),
}

/// The candidate media locations found for one torrent.
///
/// An empty candidate list is a valid "no match" outcome, not an error.
#[derive(Debug)]
pub struct MatchOutcome {
    pub manifest: Manifest,
    pub candidates: Vec<Candidate>,
}

impl MatchOutcome {
    #[must_use]
    pub fn is_match(&self) -> bool {
        !self.candidates.is_empty()
    }
}

/// Find candidate media locations for the given manifest.
///
/// Torrents with a single entry are matched against individual files whose
/// size is within `tolerance` bytes of the declared length. Torrents with
/// multiple entries are matched against folders whose aggregate size is
/// within the tolerance AND whose file count equals the entry count exactly.
/// A folder with extra or missing files never matches, even when the total
/// size happens to agree.
///
/// Returns `None` for manifests that declare no files.
#[must_use]
pub fn match_torrent(manifest: Manifest, index: &MediaIndex, tolerance: u64) -> Option<MatchOutcome> {
    if manifest.entries.is_empty() {
        return None;
    }

    let candidates = if manifest.entries.len() == 1 {
        index
            .files_of_size_within(manifest.entries[0].length, tolerance)
            .cloned()
            .map(Candidate::File)
            .collect()
    } else {
        let total_size = manifest.total_size();
        let file_count = manifest.file_count();
        index
            .folder_stats()
            .iter()
            .filter(|(_, stats)| stats.total_size.abs_diff(total_size) <= tolerance && stats.file_count == file_count)
            .map(|(folder, _)| Candidate::Folder(folder.clone()))
            .collect()
    };

    Some(MatchOutcome { manifest, candidates })
}

#[cfg(test)]
mod matching_tests {
    use super::*;

    use std::fs;
    use std::path::Path;

    use tempfile::{TempDir, tempdir};

    use crate::ignore::IgnorePolicy;
    use crate::torrent::{ManifestEntry, Metainfo};

    fn make_file(root: &Path, relative: &str, size: usize) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("should create dirs");
        }
        fs::write(&path, vec![b'x'; size]).expect("should write file");
    }

    fn manifest(name: &str, entries: Vec<(&str, u64)>, single_file: bool) -> Manifest {
        Manifest {
            source: PathBuf::from(format!("{name}.torrent")),
            name: name.to_string(),
            entries: entries
                .into_iter()
                .map(|(path, length)| ManifestEntry {
                    path: PathBuf::from(path),
                    length,
                })
                .collect(),
            single_file,
        }
    }

    fn media_tree() -> TempDir {
        let dir = tempdir().expect("should create tempdir");
        let root = dir.path();
        make_file(root, "Album/01.flac", 100);
        make_file(root, "Album/02.flac", 200);
        make_file(root, "Other/solo.mkv", 300);
        dir
    }

    #[test]
    fn test_single_entry_matches_exact_size_only_with_zero_tolerance() {
        let dir = media_tree();
        let index = MediaIndex::build(dir.path(), &IgnorePolicy::default());

        let outcome = match_torrent(manifest("solo.mkv", vec![("solo.mkv", 300)], true), &index, 0)
            .expect("should produce outcome");
        assert_eq!(
            outcome.candidates,
            vec![Candidate::File(MediaFile {
                path: dir.path().join("Other/solo.mkv"),
                size: 300
            })]
        );

        let no_match = match_torrent(manifest("solo.mkv", vec![("solo.mkv", 301)], true), &index, 0)
            .expect("should produce outcome");
        assert!(!no_match.is_match());
    }

    #[test]
    fn test_single_entry_tolerance_widens_across_size_keys() {
        let dir = media_tree();
        let index = MediaIndex::build(dir.path(), &IgnorePolicy::default());

        let outcome = match_torrent(manifest("solo.mkv", vec![("solo.mkv", 250)], true), &index, 50)
            .expect("should produce outcome");
        // 200 and 300 both within 50 bytes of 250
        assert_eq!(outcome.candidates.len(), 2);
    }

    #[test]
    fn test_multi_file_matches_folder_by_size_and_exact_count() {
        let dir = media_tree();
        let index = MediaIndex::build(dir.path(), &IgnorePolicy::default());

        let outcome = match_torrent(
            manifest("Album", vec![("01.flac", 100), ("02.flac", 200)], false),
            &index,
            0,
        )
        .expect("should produce outcome");
        assert_eq!(outcome.candidates, vec![Candidate::Folder(dir.path().join("Album"))]);
    }

    #[test]
    fn test_multi_file_count_mismatch_never_matches() {
        let dir = media_tree();
        let index = MediaIndex::build(dir.path(), &IgnorePolicy::default());

        // Same total size as Album but declared as three files
        let outcome = match_torrent(
            manifest("Album", vec![("a", 100), ("b", 100), ("c", 100)], false),
            &index,
            0,
        )
        .expect("should produce outcome");
        assert!(!outcome.is_match());
    }

    #[test]
    fn test_multi_file_size_outside_tolerance_removes_candidate() {
        let dir = media_tree();
        let index = MediaIndex::build(dir.path(), &IgnorePolicy::default());

        let matched = match_torrent(
            manifest("Album", vec![("01.flac", 100), ("02.flac", 195)], false),
            &index,
            5,
        )
        .expect("should produce outcome");
        assert!(matched.is_match());

        let unmatched = match_torrent(
            manifest("Album", vec![("01.flac", 100), ("02.flac", 194)], false),
            &index,
            5,
        )
        .expect("should produce outcome");
        assert!(!unmatched.is_match());
    }

    #[test]
    fn test_empty_manifest_is_skipped() {
        let dir = media_tree();
        let index = MediaIndex::build(dir.path(), &IgnorePolicy::default());

        assert!(match_torrent(manifest("empty", vec![], false), &index, 0).is_none());
    }

    #[test]
    fn test_decoded_one_entry_layout_matches_by_file_size() {
        // An explicit file list with one entry still matches by file size,
        // since no folder will hold exactly one file of that size here.
        let dir = tempdir().expect("should create tempdir");
        make_file(dir.path(), "Game/VIDEO_TS/VTS_01_0.BUP", 100);
        make_file(dir.path(), "Game/VIDEO_TS/RANDOM_FILE.BUP", 100);
        make_file(dir.path(), "Game/VIDEO_TS/VTS_01_1.VOB", 300);
        let index = MediaIndex::build(dir.path(), &IgnorePolicy::default());

        let metainfo: Metainfo = serde_bencode::from_bytes(
            b"d4:infod5:filesld6:lengthi100e4:pathl8:VIDEO_TS12:VTS_01_0.BUPeee4:name4:Game12:piece lengthi32768eee",
        )
        .expect("should decode");
        let manifest = Manifest::from_metainfo(Path::new("game.torrent"), &metainfo);

        let outcome = match_torrent(manifest, &index, 0).expect("should produce outcome");
        assert_eq!(outcome.candidates.len(), 2);
        assert!(outcome.candidates.iter().all(|c| matches!(c, Candidate::File(_))));
    }
}
