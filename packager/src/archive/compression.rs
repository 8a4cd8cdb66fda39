//! Compression algorithm selection.

use crate::error::{PackagerError, Result};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Compression applied to the tar stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Compression {
    /// Zstandard.
    #[default]
    Zstd,
    /// XZ/LZMA2.
    Xz,
    /// Gzip (DEFLATE).
    Gzip,
    /// Plain tar.
    None,
}

impl Compression {
    /// Every supported algorithm, in preference order.
    pub const ALL: [Self; 4] = [Self::Zstd, Self::Xz, Self::Gzip, Self::None];

    /// Return the lowercase name used on the command line and in config.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Zstd => "zstd",
            Self::Xz => "xz",
            Self::Gzip => "gzip",
            Self::None => "none",
        }
    }

    /// Return the accepted level range, or `None` when levels are ignored.
    #[must_use]
    pub const fn level_range(self) -> Option<RangeInclusive<u32>> {
        match self {
            Self::Zstd => Some(1..=19),
            Self::Xz | Self::Gzip => Some(0..=9),
            Self::None => None,
        }
    }

    /// Return the level used when none is requested.
    #[must_use]
    pub const fn default_level(self) -> u32 {
        match self {
            Self::Zstd => 19,
            Self::Xz | Self::Gzip => 6,
            Self::None => 0,
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Compression {
    type Err = PackagerError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "zstd" | "zst" => Ok(Self::Zstd),
            "xz" => Ok(Self::Xz),
            "gzip" | "gz" => Ok(Self::Gzip),
            "none" => Ok(Self::None),
            _ => Err(PackagerError::UnknownCompression {
                value: value.to_owned(),
            }),
        }
    }
}

/// A validated algorithm and level pair.
///
/// # Examples
///
/// ```
/// use apg_packager::archive::{Compression, CompressionConfig};
///
/// let config = CompressionConfig::new(Compression::Xz, 9).expect("valid level");
/// assert_eq!(config.level(), 9);
/// assert!(CompressionConfig::new(Compression::Zstd, 0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionConfig {
    algorithm: Compression,
    level: u32,
}

impl CompressionConfig {
    /// Validate `level` against the range `algorithm` accepts.
    ///
    /// [`Compression::None`] accepts any level and stores zero.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::InvalidCompressionLevel`] when the level is
    /// out of range.
    pub fn new(algorithm: Compression, level: u32) -> Result<Self> {
        let Some(range) = algorithm.level_range() else {
            return Ok(Self {
                algorithm,
                level: 0,
            });
        };
        if !range.contains(&level) {
            return Err(PackagerError::InvalidCompressionLevel {
                algorithm,
                level,
                min: *range.start(),
                max: *range.end(),
            });
        }
        Ok(Self { algorithm, level })
    }

    /// Use `algorithm` at its default level.
    #[must_use]
    pub const fn with_default_level(algorithm: Compression) -> Self {
        Self {
            algorithm,
            level: algorithm.default_level(),
        }
    }

    /// Return the algorithm.
    #[must_use]
    pub const fn algorithm(&self) -> Compression {
        self.algorithm
    }

    /// Return the level.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self::with_default_level(Compression::default())
    }
}

impl fmt::Display for CompressionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.algorithm {
            Compression::None => f.write_str("none"),
            algorithm => write!(f, "{algorithm} level {}", self.level),
        }
    }
}
