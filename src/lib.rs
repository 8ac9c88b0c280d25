pub mod collect;
pub mod config;
pub mod copy;
pub mod ignore;
pub mod index;
pub mod matching;
pub mod report;
pub mod resolve;
pub mod torrent;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Command;
use clap_complete::Shell;
use colored::Colorize;
use unicode_normalization::UnicodeNormalization;

/// Normalize every path component to Unicode NFC (Normalization Form Composed).
///
/// Rust reads paths from APFS and some network shares in NFD form,
/// where special chars like "å" come back as "a\u{30a}".
/// Torrent metadata on the other hand usually stores NFC,
/// so every path from either side is normalized before comparison.
/// https://github.com/unicode-rs/unicode-normalization
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.iter()
        .map(|part| os_str_to_string(part).nfc().collect::<String>())
        .collect()
}

/// Convert `OsStr` to String with invalid Unicode handling.
pub fn os_str_to_string(name: &OsStr) -> String {
    name.to_str().map_or_else(
        || name.to_string_lossy().replace('\u{FFFD}', ""),
        std::string::ToString::to_string,
    )
}

/// Convert given path to filename string with invalid Unicode handling.
#[must_use]
pub fn path_to_filename_string(path: &Path) -> String {
    os_str_to_string(path.file_name().unwrap_or_default())
}

/// Convert given path to file stem string with invalid Unicode handling.
#[must_use]
pub fn path_to_file_stem_string(path: &Path) -> String {
    os_str_to_string(path.file_stem().unwrap_or_default())
}

/// Gets the relative path or filename from a full path based on a root directory.
///
/// If the full path is within the root directory, the function returns the relative path.
/// Otherwise, it returns just the filename. If the filename cannot be determined, the
/// full path is returned.
#[must_use]
pub fn get_relative_path_or_filename(full_path: &Path, root: &Path) -> String {
    if full_path == root {
        return full_path.file_name().unwrap_or_default().to_string_lossy().to_string();
    }
    full_path.strip_prefix(root).map_or_else(
        |_| {
            full_path.file_name().map_or_else(
                || full_path.display().to_string(),
                |name| name.to_string_lossy().to_string(),
            )
        },
        |relative_path| relative_path.display().to_string(),
    )
}

/// Resolve the given path to an absolute path, verifying it is an existing directory.
pub fn resolve_directory(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        anyhow::bail!("Path does not exist or is not accessible: '{}'", path.display());
    }
    let absolute =
        dunce::canonicalize(path).with_context(|| format!("Failed to resolve path: '{}'", path.display()))?;
    if !absolute.is_dir() {
        anyhow::bail!("Path is not a directory: '{}'", absolute.display());
    }
    Ok(absolute)
}

/// Format bytes as human-readable size
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[inline]
pub fn print_error(message: &str) {
    eprintln!("{}", format!("Error: {message}").red());
}

#[macro_export]
macro_rules! print_error {
    ($($arg:tt)*) => {
        $crate::print_error(&format!($($arg)*))
    };
}

#[inline]
pub fn print_warning(message: &str) {
    eprintln!("{}", message.yellow());
}

#[macro_export]
macro_rules! print_warning {
    ($($arg:tt)*) => {
        $crate::print_warning(&format!($($arg)*))
    };
}

/// Generate a shell completion script for the given shell to stdout.
pub fn generate_shell_completion(shell: Shell, mut command: Command, command_name: &str) {
    clap_complete::generate(shell, &mut command, command_name, &mut std::io::stdout());
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    use tempfile::tempdir;

    #[test]
    fn test_normalize_path_composes_decomposed_accents() {
        // "å" as NFD: 'a' followed by combining ring above
        let decomposed = PathBuf::from("media/p\u{0061}\u{030a}.mkv");
        let composed = PathBuf::from("media/p\u{00e5}.mkv");
        assert_eq!(normalize_path(&decomposed), composed);
        assert_eq!(normalize_path(&composed), composed);
    }

    #[test]
    fn test_normalize_path_is_idempotent() {
        let path = PathBuf::from("Vide\u{0301}o/cle\u{0301}.mp4");
        let once = normalize_path(&path);
        let twice = normalize_path(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_normalize_path_plain_ascii_unchanged() {
        let path = Path::new("VIDEO_TS/VTS_01_0.BUP");
        assert_eq!(normalize_path(path), path);
    }

    #[test]
    fn test_relative_path_or_filename() {
        let root = Path::new("/root/dir");
        let full_path = root.join("subdir/file.txt");
        assert_eq!(get_relative_path_or_filename(&full_path, root), "subdir/file.txt");

        let outside_path = Path::new("/other/another.txt");
        assert_eq!(get_relative_path_or_filename(outside_path, root), "another.txt");
    }

    #[test]
    fn test_resolve_directory_valid() {
        let dir = tempdir().expect("should create tempdir");
        let resolved = resolve_directory(dir.path());
        assert!(resolved.is_ok());
    }

    #[test]
    fn test_resolve_directory_nonexistent() {
        assert!(resolve_directory(Path::new("nonexistent")).is_err());
    }

    #[test]
    fn test_resolve_directory_rejects_file() {
        let dir = tempdir().expect("should create tempdir");
        let file = dir.path().join("file.txt");
        std::fs::File::create(&file).expect("should create file");
        assert!(resolve_directory(&file).is_err());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
    }
}
