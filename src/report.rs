//! Report mode: compare torrent manifests against the media directory.
//!
//! Lists media files not referenced by any torrent,
//! and torrent-referenced files missing from the media directory.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::Result;
use colored::Colorize;

use crate::ignore::IgnorePolicy;
use crate::index::MediaIndex;
use crate::print_error;
use crate::torrent::{self, Manifest};

/// Comparison result between a torrent directory and a media directory.
#[derive(Debug, Default)]
pub struct Report {
    /// Media files (relative, normalized) not referenced by any torrent.
    pub extra: BTreeSet<PathBuf>,
    /// Referenced paths missing from media, grouped per torrent filename.
    pub missing: BTreeMap<String, BTreeSet<PathBuf>>,
}

impl Report {
    /// Compare every torrent in `torrent_dir` against the files under `media_dir`.
    ///
    /// Torrents that fail to decode are logged and excluded.
    /// Ignored filenames are never reported as extra or missing.
    ///
    /// # Errors
    /// Returns an error if the torrent directory cannot be listed.
    pub fn build(torrent_dir: &Path, media_dir: &Path, ignore: &IgnorePolicy) -> Result<Self> {
        let torrent_paths = torrent::find_torrent_files(torrent_dir)?;
        let index = MediaIndex::build(media_dir, ignore);
        let media_files = index.relative_paths();

        let mut all_referenced: BTreeSet<PathBuf> = BTreeSet::new();
        let mut missing: BTreeMap<String, BTreeSet<PathBuf>> = BTreeMap::new();

        for path in &torrent_paths {
            let manifest = match Manifest::load(path) {
                Ok(manifest) => manifest,
                Err(error) => {
                    print_error!("Failed to load torrent {}: {error}", path.display());
                    continue;
                }
            };
            for referenced in manifest.referenced_paths() {
                if !media_files.contains(&referenced)
                    && !ignore.is_ignored(&crate::path_to_filename_string(&referenced))
                {
                    missing.entry(manifest.file_name()).or_default().insert(referenced.clone());
                }
                all_referenced.insert(referenced);
            }
        }

        let extra = media_files.difference(&all_referenced).cloned().collect();
        Ok(Self { extra, missing })
    }

    /// True when every media file is referenced and every referenced file exists.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.extra.is_empty() && self.missing.is_empty()
    }

    /// Pretty-print the comparison.
    pub fn print(&self) {
        if self.extra.is_empty() {
            println!("{}", "All media files are referenced in torrents.".green());
        } else {
            println!("{}", "Files in media directory not in any torrent:".yellow());
            for path in &self.extra {
                println!("  {}", path.display());
            }
        }
        println!();

        if self.missing.is_empty() {
            println!("{}", "All torrent files are accounted for in media.".green());
        } else {
            println!("{}", "Files referenced by torrents but missing from media directory:".yellow());
            for (torrent_name, files) in &self.missing {
                println!("  {}", torrent_name.cyan());
                for path in files {
                    println!("    {}", path.display());
                }
            }
        }
    }
}

/// Run report mode: build the comparison and print it.
pub fn run(torrent_dir: &Path, media_dir: &Path, ignore: &IgnorePolicy) -> Result<()> {
    println!(
        "Comparing torrents in {} against media in {}\n",
        torrent_dir.display().to_string().magenta(),
        media_dir.display().to_string().magenta()
    );
    let report = Report::build(torrent_dir, media_dir, ignore)?;
    report.print();
    Ok(())
}
