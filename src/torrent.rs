//! Torrent file parsing module.
//!
//! Provides structs to decode `.torrent` metainfo files and extract the
//! file manifest declared inside them.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;

use crate::normalize_path;

/// Fallback name for torrents with no name in the info dictionary.
const UNKNOWN_TORRENT_NAME: &str = "Unknown_Torrent";

/// Represents a parsed `.torrent` file.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Metainfo {
    #[serde(default)]
    pub announce: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    #[serde(rename = "created by")]
    pub created_by: Option<String>,
    #[serde(default)]
    #[serde(rename = "creation date")]
    pub creation_date: Option<i64>,
    #[serde(default)]
    pub encoding: Option<String>,
    pub info: Info,
}

/// Contains metadata about the torrent content.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Info {
    #[serde(default)]
    pub files: Option<Vec<File>>,
    #[serde(default)]
    pub length: Option<u64>,
    #[serde(default)]
    pub md5sum: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "piece length")]
    pub piece_length: i64,
    #[serde(default)]
    pub pieces: ByteBuf,
    #[serde(default)]
    pub private: Option<u8>,
}

/// Represents a file within a multi-file torrent.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct File {
    pub length: u64,
    pub path: Vec<String>,
    #[serde(default)]
    pub md5sum: Option<String>,
}

/// One file declared by a torrent: relative path and byte length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Path relative to the torrent root, NFC-normalized.
    pub path: PathBuf,
    /// Declared length in bytes.
    pub length: u64,
}

/// The file manifest extracted from one torrent file.
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Path of the `.torrent` file this was read from.
    pub source: PathBuf,
    /// Declared root name: the single file's name, or the root folder name.
    pub name: String,
    /// Declared files in declaration order.
    pub entries: Vec<ManifestEntry>,
    /// True when the metainfo has no explicit file list.
    pub single_file: bool,
}

impl Metainfo {
    /// Create `Metainfo` from bytes.
    ///
    /// # Errors
    /// Returns an error if the bytes cannot be parsed as a torrent.
    pub fn from_bytes(buffer: &[u8]) -> Result<Self> {
        serde_bencode::from_bytes(buffer).context("Failed to parse torrent file")
    }
}

impl Manifest {
    /// Read and decode a `.torrent` file, then extract its manifest.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or decoded.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("Failed to read torrent file: {}", path.display()))?;
        let metainfo = Metainfo::from_bytes(&bytes)?;
        Ok(Self::from_metainfo(path, &metainfo))
    }

    /// Extract the manifest from decoded metainfo.
    ///
    /// Single-file torrents declare one entry whose path is the torrent name.
    /// Multi-file torrents declare paths relative to the root folder name,
    /// even when the explicit file list holds only one entry.
    #[must_use]
    pub fn from_metainfo(source: &Path, metainfo: &Metainfo) -> Self {
        let name = metainfo
            .info
            .name
            .clone()
            .unwrap_or_else(|| UNKNOWN_TORRENT_NAME.to_string());

        let (entries, single_file) = metainfo.info.files.as_ref().map_or_else(
            || {
                let entry = ManifestEntry {
                    path: normalize_path(Path::new(&name)),
                    length: metainfo.info.length.unwrap_or(0),
                };
                (vec![entry], true)
            },
            |files| {
                let entries = files
                    .iter()
                    .map(|file| ManifestEntry {
                        path: normalize_path(&file.path.iter().collect::<PathBuf>()),
                        length: file.length,
                    })
                    .collect();
                (entries, false)
            },
        );

        Self {
            source: source.to_path_buf(),
            name,
            entries,
            single_file,
        }
    }

    /// Total size of all declared files.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|entry| entry.length).sum()
    }

    /// Number of declared files.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.entries.len()
    }

    /// Filename of the source `.torrent` file.
    #[must_use]
    pub fn file_name(&self) -> String {
        crate::path_to_filename_string(&self.source)
    }

    /// Declared root name with path separators replaced so it is safe as a directory name.
    #[must_use]
    pub fn safe_name(&self) -> String {
        self.name.replace('/', "_").trim().to_string()
    }

    /// All paths this torrent expects to exist, relative to the media root.
    ///
    /// Multi-file layouts are rooted at the declared folder name.
    #[must_use]
    pub fn referenced_paths(&self) -> Vec<PathBuf> {
        if self.single_file {
            self.entries.iter().map(|entry| entry.path.clone()).collect()
        } else {
            let root = normalize_path(Path::new(&self.name));
            self.entries.iter().map(|entry| root.join(&entry.path)).collect()
        }
    }
}

/// List torrent files in the given directory, matching the `*.torrent*` pattern.
///
/// Non-recursive, sorted by filename. Matches plain `.torrent` files as well as
/// marker variants like `.torrent.added`.
pub fn find_torrent_files(torrent_dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(fs::read_dir(torrent_dir)
        .with_context(|| format!("Failed to read torrent directory: {}", torrent_dir.display()))?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && crate::path_to_filename_string(path).contains(".torrent"))
        .sorted()
        .collect())
}
