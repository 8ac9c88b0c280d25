//! Configuration module.
//!
//! Handles reading configuration from CLI arguments and the user config file.

use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::Result;
use serde::Deserialize;

use crate::ignore::IgnorePolicy;

const PROJECT_NAME: &str = env!("CARGO_PKG_NAME");

/// Path to the user config file: `$HOME/.config/torrentmatch.toml`
///
/// Returns `None` if the home directory cannot be determined.
pub static CONFIG_PATH: LazyLock<Option<PathBuf>> = LazyLock::new(|| {
    let home_dir = dirs::home_dir()?;
    Some(home_dir.join(".config").join(format!("{PROJECT_NAME}.toml")))
});

/// Config from the user config file.
#[derive(Debug, Default, Deserialize)]
pub struct UserConfig {
    /// Maximum byte-size difference for size equality during matching.
    #[serde(default)]
    tolerance_bytes: Option<u64>,
    /// Overwrite mode for media copies.
    #[serde(default)]
    overwrite: Option<bool>,
    #[serde(default)]
    verbose: bool,
    /// Extra exact filenames to ignore on top of the built-in deny-list.
    #[serde(default)]
    ignored_names: Vec<String>,
    /// Extra filename suffixes to ignore.
    #[serde(default)]
    ignored_suffixes: Vec<String>,
}

/// Wrapper needed for parsing the config file section.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    torrentmatch: UserConfig,
}

/// Final config created from CLI arguments and user config file.
#[derive(Debug, Clone)]
pub struct Config {
    pub tolerance: u64,
    pub overwrite: bool,
    pub verbose: bool,
    pub ignore: IgnorePolicy,
}

impl UserConfig {
    /// Try to read user config from the file if it exists.
    /// Otherwise, fall back to default config.
    ///
    /// # Errors
    /// Returns an error if config file exists but cannot be read or parsed.
    pub fn get_user_config() -> Result<Self> {
        let Some(path) = CONFIG_PATH.as_deref() else {
            return Ok(Self::default());
        };

        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse config file {}:\n{e}", path.display())),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(anyhow::anyhow!(
                "Failed to read config file {}: {error}",
                path.display()
            )),
        }
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns an error if the TOML string is invalid.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        toml::from_str::<ConfigFile>(toml_str)
            .map(|config| config.torrentmatch)
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {e}"))
    }
}

impl Config {
    /// Create config from the given command line values and the user config file.
    /// CLI values take precedence over the config file.
    ///
    /// # Errors
    /// Returns an error if the config file cannot be read or parsed.
    pub fn new(tolerance: Option<u64>, no_overwrite: bool, verbose: bool) -> Result<Self> {
        let user_config = UserConfig::get_user_config()?;
        Ok(Self::merge(&user_config, tolerance, no_overwrite, verbose))
    }

    /// Combine CLI values with a parsed user config.
    #[must_use]
    pub fn merge(user_config: &UserConfig, tolerance: Option<u64>, no_overwrite: bool, verbose: bool) -> Self {
        Self {
            tolerance: tolerance.or(user_config.tolerance_bytes).unwrap_or(0),
            overwrite: !no_overwrite && user_config.overwrite.unwrap_or(true),
            verbose: verbose || user_config.verbose,
            ignore: IgnorePolicy::with_extra(&user_config.ignored_names, &user_config.ignored_suffixes),
        }
    }
}
