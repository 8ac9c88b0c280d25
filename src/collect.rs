//! Collect mode: match torrents against media and copy both into organized output directories.

use std::path::{Path, PathBuf};

use anyhow::Result;
use colored::Colorize;

use crate::copy::{CopyOutcome, quick_copy};
use crate::ignore::IgnorePolicy;
use crate::index::{MediaFile, MediaIndex};
use crate::matching::{Candidate, MatchOutcome, match_torrent};
use crate::resolve::resolve_entry;
use crate::torrent::{self, Manifest};
use crate::{print_error, print_warning};

/// Everything collect mode needs for one run.
#[derive(Debug)]
pub struct CollectOptions {
    pub torrent_dir: PathBuf,
    pub media_dir: PathBuf,
    pub torrents_out: PathBuf,
    pub media_out: PathBuf,
    /// Maximum byte-size difference for two sizes to be considered equal.
    pub tolerance: u64,
    /// Overwrite mode for media copies.
    pub overwrite: bool,
    pub ignore: IgnorePolicy,
    pub verbose: bool,
}

/// Counters for one collect run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CollectSummary {
    pub matched: usize,
    pub unmatched: usize,
    pub copied: usize,
    pub skipped: usize,
    pub renamed: usize,
    pub low_confidence: usize,
    pub unresolved: usize,
}

impl CollectSummary {
    fn count(&mut self, outcome: &CopyOutcome) {
        match outcome {
            CopyOutcome::Copied => self.copied += 1,
            CopyOutcome::Skipped => self.skipped += 1,
            CopyOutcome::Renamed(_) => self.renamed += 1,
        }
    }
}

/// Run collect mode: index media, match every torrent, copy matches to the output roots.
///
/// Per-torrent decode failures, unresolved entries and individual copy errors
/// are logged and skipped; the run only fails when the torrent directory
/// cannot be listed.
pub fn run(options: &CollectOptions) -> Result<CollectSummary> {
    let torrent_paths = torrent::find_torrent_files(&options.torrent_dir)?;
    let index = MediaIndex::build(&options.media_dir, &options.ignore);

    if options.verbose {
        println!(
            "Indexed {} media files ({}) in {} folders",
            index.file_count(),
            crate::format_size(index.total_size()),
            index.folder_stats().len()
        );
    }

    let mut summary = CollectSummary::default();

    for path in &torrent_paths {
        let manifest = match Manifest::load(path) {
            Ok(manifest) => manifest,
            Err(error) => {
                print_error!("Failed to load torrent {}: {error}", path.display());
                continue;
            }
        };
        let Some(outcome) = match_torrent(manifest, &index, options.tolerance) else {
            print_warning!("Skipping torrent with no files: {}", path.display());
            continue;
        };

        if !outcome.is_match() {
            println!("{} {}", "X".red(), outcome.manifest.file_name());
            summary.unmatched += 1;
            continue;
        }

        println!("{}", outcome.manifest.file_name().bold());
        summary.matched += 1;
        copy_torrent_file(&outcome.manifest, &options.torrents_out, &mut summary);
        copy_media_files(&outcome, &index, options, &mut summary);
    }

    println!(
        "\n{}",
        format!(
            "{} matched, {} unmatched, {} copied, {} skipped, {} renamed",
            summary.matched, summary.unmatched, summary.copied, summary.skipped, summary.renamed
        )
        .bold()
    );
    if summary.low_confidence > 0 {
        print_warning!("{} file(s) chosen with low confidence", summary.low_confidence);
    }
    if summary.unresolved > 0 {
        print_warning!("{} manifest entries could not be resolved", summary.unresolved);
    }

    Ok(summary)
}

/// Copy the `.torrent` file itself to the torrent output directory.
///
/// A trailing `.added` marker is dropped from the destination name.
/// Existing files are never overwritten; size conflicts go to a renamed sibling.
fn copy_torrent_file(manifest: &Manifest, torrents_out: &Path, summary: &mut CollectSummary) {
    let mut dest_name = manifest.file_name();
    if let Some(stripped) = dest_name.strip_suffix(".added") {
        dest_name = stripped.to_string();
    }
    let dest = torrents_out.join(dest_name);
    match quick_copy(&manifest.source, &dest, false) {
        Ok(outcome) => summary.count(&outcome),
        Err(error) => print_error!(
            "Failed to copy {} -> {}: {error}",
            manifest.source.display(),
            dest.display()
        ),
    }
}

/// Copy the matched media into the media output directory.
fn copy_media_files(outcome: &MatchOutcome, index: &MediaIndex, options: &CollectOptions, summary: &mut CollectSummary) {
    let manifest = &outcome.manifest;

    if manifest.single_file {
        // One declared file whose name is the torrent name: no per-entry
        // resolution needed, skip-if-same-size collapses duplicate candidates.
        let dest = options.media_out.join(manifest.safe_name());
        for candidate in &outcome.candidates {
            if let Candidate::File(file) = candidate {
                log_copy(&file.path, &dest, &options.media_out);
                match quick_copy(&file.path, &dest, options.overwrite) {
                    Ok(copy_outcome) => summary.count(&copy_outcome),
                    Err(error) => {
                        print_error!("Failed to copy {} -> {}: {error}", file.path.display(), dest.display());
                    }
                }
            }
        }
        return;
    }

    let dest_dir = options.media_out.join(manifest.safe_name());
    for entry in &manifest.entries {
        let candidates = entry_candidates(&outcome.candidates, index, entry.length);
        let Some(resolution) = resolve_entry(entry, &candidates) else {
            print_warning!(
                "No local file of size {} found for {}",
                crate::format_size(entry.length),
                entry.path.display()
            );
            summary.unresolved += 1;
            continue;
        };
        if resolution.low_confidence {
            summary.low_confidence += 1;
            print_warning!(
                "Low confidence pick for {} (best score {:.2}): {}",
                entry.path.display(),
                resolution.score.unwrap_or_default(),
                resolution.file.path.display()
            );
        }

        let dest = dest_dir.join(&entry.path);
        log_copy(&resolution.file.path, &dest, &options.media_out);
        match quick_copy(&resolution.file.path, &dest, options.overwrite) {
            Ok(copy_outcome) => summary.count(&copy_outcome),
            Err(error) => {
                print_error!(
                    "Failed to copy {} -> {}: {error}",
                    resolution.file.path.display(),
                    dest.display()
                );
            }
        }
    }
}

/// Same-size files from the index that live inside one of the matched locations.
///
/// Index walk order is preserved so downstream tie-breaking stays deterministic.
fn entry_candidates(candidates: &[Candidate], index: &MediaIndex, length: u64) -> Vec<MediaFile> {
    index
        .files_of_size(length)
        .iter()
        .filter(|file| {
            candidates.iter().any(|candidate| match candidate {
                Candidate::File(matched) => matched.path == file.path,
                Candidate::Folder(folder) => file.path.starts_with(folder),
            })
        })
        .cloned()
        .collect()
}

fn log_copy(source: &Path, dest: &Path, media_out: &Path) {
    let source_name = crate::path_to_filename_string(source);
    let dest_name = crate::path_to_filename_string(dest);
    if source_name == dest_name {
        println!("  {} {}", "->".green(), crate::get_relative_path_or_filename(dest, media_out));
    } else {
        println!(
            "  {} {} {} {}",
            "->".green(),
            source_name,
            "renamed to".yellow(),
            crate::get_relative_path_or_filename(dest, media_out)
        );
    }
}
