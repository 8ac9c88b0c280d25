//! Per-entry candidate resolution by filename similarity.
//!
//! When several same-size files could satisfy one manifest entry,
//! the entry's filename decides: exact match first, then a fuzzy
//! similarity ranking with a deterministic low-confidence fallback.

use std::path::Path;

use difference::{Changeset, Difference};

use crate::index::MediaFile;
use crate::torrent::ManifestEntry;

/// Minimum similarity score required to trust a fuzzy match.
pub const CONFIDENCE_THRESHOLD: f64 = 0.55;

/// The file chosen for one manifest entry.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub file: MediaFile,
    /// Best similarity score when fuzzy ranking was needed.
    pub score: Option<f64>,
    /// True when no candidate scored above the confidence threshold
    /// and the first candidate was chosen arbitrarily.
    pub low_confidence: bool,
}

/// Filename stem in comparable form: no extension, lowercased, underscores as spaces.
fn comparable_stem(name: &str) -> String {
    crate::path_to_file_stem_string(Path::new(name))
        .to_lowercase()
        .replace('_', " ")
}

/// Similarity ratio in [0, 1] between two filenames, ignoring case and extensions.
///
/// The ratio is 2·M/T where M is the number of matched characters between the
/// two comparable stems and T the total character count of both.
#[must_use]
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let a = comparable_stem(a);
    let b = comparable_stem(b);
    let total = a.chars().count() + b.chars().count();
    if total == 0 {
        return 1.0;
    }
    let changeset = Changeset::new(&a, &b, "");
    let matched: usize = changeset
        .diffs
        .iter()
        .filter_map(|diff| match diff {
            Difference::Same(same) => Some(same.chars().count()),
            _ => None,
        })
        .sum();
    2.0 * matched as f64 / total as f64
}

/// Choose one file for the given manifest entry from same-size candidates.
///
/// `candidates` must already be filtered to the entry's exact size and keep
/// their first-seen order: score ties and the low-confidence fallback both
/// resolve to the earliest candidate.
///
/// Returns `None` when there is nothing to choose from.
#[must_use]
pub fn resolve_entry(entry: &ManifestEntry, candidates: &[MediaFile]) -> Option<Resolution> {
    let first = candidates.first()?;
    let entry_name = crate::path_to_filename_string(&entry.path);
    let entry_name_lower = entry_name.to_lowercase();

    let exact: Vec<&MediaFile> = candidates
        .iter()
        .filter(|file| crate::path_to_filename_string(&file.path).to_lowercase() == entry_name_lower)
        .collect();
    if let [only] = exact.as_slice() {
        return Some(Resolution {
            file: (*only).clone(),
            score: None,
            low_confidence: false,
        });
    }

    let mut best: (&MediaFile, f64) = (first, f64::MIN);
    for file in candidates {
        let score = name_similarity(&entry_name, &crate::path_to_filename_string(&file.path));
        if score > best.1 {
            best = (file, score);
        }
    }

    let (file, score) = best;
    if score > CONFIDENCE_THRESHOLD {
        Some(Resolution {
            file: file.clone(),
            score: Some(score),
            low_confidence: false,
        })
    } else {
        Some(Resolution {
            file: first.clone(),
            score: Some(score),
            low_confidence: true,
        })
    }
}

#[cfg(test)]
mod resolve_tests {
    use super::*;

    use std::path::PathBuf;

    fn media_file(path: &str, size: u64) -> MediaFile {
        MediaFile {
            path: PathBuf::from(path),
            size,
        }
    }

    fn entry(path: &str, length: u64) -> ManifestEntry {
        ManifestEntry {
            path: PathBuf::from(path),
            length,
        }
    }

    #[test]
    fn test_similarity_identical_names() {
        assert!(name_similarity("VTS_01_0.BUP", "VTS_01_0.BUP") >= 0.9);
    }

    #[test]
    fn test_similarity_unrelated_names() {
        assert!(name_similarity("VTS_01_0.BUP", "RANDOM_FILE.BUP") < 0.9);
        assert!(name_similarity("VTS_01_0.BUP", "RANDOM_FILE.BUP") < CONFIDENCE_THRESHOLD);
    }

    #[test]
    fn test_similarity_ignores_case_and_extension() {
        assert!(name_similarity("Movie.mkv", "MOVIE.avi") >= 0.99);
    }

    #[test]
    fn test_similarity_underscores_equal_spaces() {
        assert!(name_similarity("some_long_name.mp4", "some long name.mp4") >= 0.99);
    }

    #[test]
    fn test_similarity_partial_overlap() {
        let score = name_similarity("show.s01e01.mkv", "show.s01e02.mkv");
        assert!(score > CONFIDENCE_THRESHOLD);
        assert!(score < 1.0);
    }

    #[test]
    fn test_resolve_no_candidates() {
        assert!(resolve_entry(&entry("a/file.bin", 10), &[]).is_none());
    }

    #[test]
    fn test_resolve_single_exact_name_match() {
        let candidates = vec![
            media_file("/media/VIDEO_TS/RANDOM_FILE.BUP", 100),
            media_file("/media/VIDEO_TS/VTS_01_0.BUP", 100),
        ];
        let resolution =
            resolve_entry(&entry("VIDEO_TS/VTS_01_0.BUP", 100), &candidates).expect("should resolve");
        assert_eq!(resolution.file.path, PathBuf::from("/media/VIDEO_TS/VTS_01_0.BUP"));
        assert!(!resolution.low_confidence);
        assert!(resolution.score.is_none());
    }

    #[test]
    fn test_resolve_exact_name_match_is_case_insensitive() {
        let candidates = vec![
            media_file("/media/other.bup", 100),
            media_file("/media/vts_01_0.bup", 100),
        ];
        let resolution =
            resolve_entry(&entry("VIDEO_TS/VTS_01_0.BUP", 100), &candidates).expect("should resolve");
        assert_eq!(resolution.file.path, PathBuf::from("/media/vts_01_0.bup"));
    }

    #[test]
    fn test_resolve_two_exact_matches_falls_through_to_fuzzy() {
        // Both named identically: fuzzy ranking scores them equally,
        // first seen wins the tie.
        let candidates = vec![
            media_file("/media/a/episode.mkv", 100),
            media_file("/media/b/episode.mkv", 100),
        ];
        let resolution = resolve_entry(&entry("episode.mkv", 100), &candidates).expect("should resolve");
        assert_eq!(resolution.file.path, PathBuf::from("/media/a/episode.mkv"));
        assert!(!resolution.low_confidence);
    }

    #[test]
    fn test_resolve_fuzzy_prefers_similar_name() {
        let candidates = vec![
            media_file("/media/completely unrelated.vob", 100),
            media_file("/media/VTS 01 0 (copy).BUP", 100),
        ];
        let resolution =
            resolve_entry(&entry("VIDEO_TS/VTS_01_0.BUP", 100), &candidates).expect("should resolve");
        assert_eq!(resolution.file.path, PathBuf::from("/media/VTS 01 0 (copy).BUP"));
        assert!(!resolution.low_confidence);
    }

    #[test]
    fn test_resolve_low_confidence_falls_back_to_first() {
        let candidates = vec![
            media_file("/media/zzzz.bin", 100),
            media_file("/media/qqqq.bin", 100),
        ];
        let resolution = resolve_entry(&entry("dir/something.mkv", 100), &candidates).expect("should resolve");
        assert_eq!(resolution.file.path, PathBuf::from("/media/zzzz.bin"));
        assert!(resolution.low_confidence);
    }

    #[test]
    fn test_resolve_tie_keeps_first_seen_order() {
        // Same stem after normalization: identical scores, first candidate wins
        let candidates = vec![
            media_file("/media/one/track_01.flac", 100),
            media_file("/media/two/track 01.flac", 100),
        ];
        let resolution = resolve_entry(&entry("track-01.flac", 100), &candidates).expect("should resolve");
        assert_eq!(resolution.file.path, PathBuf::from("/media/one/track_01.flac"));
    }
}
