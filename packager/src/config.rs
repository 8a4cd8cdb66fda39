//! Optional `apg.toml` configuration.
//!
//! The file supplies defaults for settings the command line leaves unset:
//!
//! ```toml
//! [compression]
//! algorithm = "xz"
//! level = 9
//!
//! [output]
//! directory = "dist"
//! ```
//!
//! Command-line flags win over the file, and the file wins over built-in
//! defaults. Every key is optional and unknown keys are rejected.

use crate::archive::{Compression, CompressionConfig};
use crate::error::{PackagerError, Result};
use log::debug;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Configuration file looked up in the working directory when `--config`
/// is not given.
pub const CONFIG_FILE: &str = "apg.toml";

/// Settings read from `apg.toml`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PackagerConfig {
    /// The `[compression]` table.
    pub compression: CompressionSection,
    /// The `[output]` table.
    pub output: OutputSection,
}

/// Archive compression defaults.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CompressionSection {
    /// Algorithm name: `zstd`, `xz`, `gzip`, or `none`.
    pub algorithm: Option<String>,
    /// Level within the algorithm's accepted range.
    pub level: Option<u32>,
}

/// Output location defaults.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    /// Directory that receives the derived package filename.
    pub directory: Option<PathBuf>,
}

impl PackagerConfig {
    /// Read and parse the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::Config`] when the file cannot be read or is
    /// not valid configuration.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with(path, |path| fs::read_to_string(path))
    }

    /// Parse the configuration returned by `reader` for `path`.
    ///
    /// Lets tests supply file contents without touching the filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::Config`] when `reader` fails or the contents
    /// do not parse.
    ///
    /// # Examples
    ///
    /// ```
    /// use apg_packager::config::PackagerConfig;
    /// use std::path::Path;
    ///
    /// let config = PackagerConfig::load_with(Path::new("apg.toml"), |_| {
    ///     Ok("[compression]\nalgorithm = \"xz\"\n".to_owned())
    /// })
    /// .expect("valid configuration");
    /// assert_eq!(config.compression.algorithm.as_deref(), Some("xz"));
    /// ```
    pub fn load_with<F>(path: &Path, reader: F) -> Result<Self>
    where
        F: FnOnce(&Path) -> io::Result<String>,
    {
        let source = reader(path).map_err(|err| PackagerError::Config {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        let config = toml::from_str(&source).map_err(|err| PackagerError::Config {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load `explicit` when given, else `apg.toml` in the working directory
    /// when present, else the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::Config`] when the chosen file cannot be read
    /// or parsed. An explicit path that does not exist is an error.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let implicit = Path::new(CONFIG_FILE);
        if implicit.is_file() {
            Self::load(implicit)
        } else {
            Ok(Self::default())
        }
    }

    /// Combine command-line choices with the file's compression defaults.
    ///
    /// A missing level falls back to the chosen algorithm's default.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::UnknownCompression`] for an unrecognised
    /// algorithm name in the file, or
    /// [`PackagerError::InvalidCompressionLevel`] for an out-of-range level.
    pub fn resolve_compression(
        &self,
        algorithm: Option<Compression>,
        level: Option<u32>,
    ) -> Result<CompressionConfig> {
        let file_algorithm = self
            .compression
            .algorithm
            .as_deref()
            .map(str::parse::<Compression>)
            .transpose()?;
        let algorithm = algorithm.or(file_algorithm).unwrap_or_default();
        let level = level
            .or(self.compression.level)
            .unwrap_or_else(|| algorithm.default_level());
        CompressionConfig::new(algorithm, level)
    }

    /// Combine a command-line output directory with the file's default.
    ///
    /// Falls back to the working directory.
    #[must_use]
    pub fn resolve_output_dir(&self, directory: Option<&Path>) -> PathBuf {
        directory
            .or(self.output.directory.as_deref())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    }
}
