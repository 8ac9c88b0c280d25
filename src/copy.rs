//! Safe file copying.
//!
//! Copies are skipped when the destination already holds a file of the same
//! size, which makes re-running collection after an interrupted run converge
//! instead of duplicating work.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Suffixes stripped from a destination name before building a collision-free sibling.
const STRIP_SUFFIXES: &[&str] = &[".added", ".torrent"];

/// What a copy call actually did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    /// Data was transferred to the destination.
    Copied,
    /// Destination was already in sync (or is the source itself).
    Skipped,
    /// Destination existed with different content, data went to a renamed sibling.
    Renamed(PathBuf),
}

/// Copy `source` to `dest`, skipping when the destination already matches by size.
///
/// In overwrite mode an existing destination with a different size is replaced.
/// In no-overwrite mode it is preserved and the copy goes to a collision-free
/// sibling name instead. Parent directories are created as needed.
///
/// # Errors
/// Returns an error if the source cannot be read or the copy fails;
/// callers log it and continue with the next file.
pub fn quick_copy(source: &Path, dest: &Path, overwrite: bool) -> Result<CopyOutcome> {
    if same_location(source, dest) {
        return Ok(CopyOutcome::Skipped);
    }

    let source_size = fs::metadata(source)
        .with_context(|| format!("Failed to read source file metadata: {}", source.display()))?
        .len();

    if let Ok(dest_metadata) = fs::metadata(dest) {
        if dest_metadata.len() == source_size {
            return Ok(CopyOutcome::Skipped);
        }
        if !overwrite {
            let renamed = collision_free_name(dest, source_size);
            copy_with_parents(source, &renamed)?;
            return Ok(CopyOutcome::Renamed(renamed));
        }
    }

    copy_with_parents(source, dest)?;
    Ok(CopyOutcome::Copied)
}

fn copy_with_parents(source: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::copy(source, dest)
        .with_context(|| format!("Failed to copy {} -> {}", source.display(), dest.display()))?;
    Ok(())
}

/// Check if both paths resolve to the same existing filesystem location.
fn same_location(source: &Path, dest: &Path) -> bool {
    match (dunce::canonicalize(source), dunce::canonicalize(dest)) {
        (Ok(resolved_source), Ok(resolved_dest)) => resolved_source == resolved_dest,
        _ => false,
    }
}

/// Build a non-clobbering sibling name for a blocked destination.
///
/// Strips the known `.torrent` / `.added` suffixes from the destination name,
/// appends the source's byte size and re-adds the `.torrent` extension.
fn collision_free_name(dest: &Path, source_size: u64) -> PathBuf {
    let mut stem = crate::path_to_filename_string(dest);
    for suffix in STRIP_SUFFIXES {
        if let Some(stripped) = stem.strip_suffix(suffix) {
            stem = stripped.to_string();
        }
    }
    dest.with_file_name(format!("{stem}_{source_size}.torrent"))
}
