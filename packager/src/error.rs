//! Error types for the APG packager.
//!
//! Structural and content problems found while validating a package tree are
//! aggregated into a [`ValidationReport`] and surfaced together as
//! [`PackagerError::Validation`]. Everything else (I/O, archive codec, rename,
//! configuration) aborts the current stage on first occurrence.

use crate::archive::Compression;
use crate::layout::ValidationReport;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building an APG package.
#[derive(Debug, Error)]
pub enum PackagerError {
    /// The source directory is missing or is not a directory.
    #[error("source directory {} does not exist or is not a directory", .path.display())]
    SourceNotFound {
        /// Path supplied by the caller.
        path: PathBuf,
    },

    /// The source tree violates the package layout contract.
    #[error("package validation failed with {} problem(s):\n{report}", .report.len())]
    Validation {
        /// Every violation found during the validation pass, in rule order.
        report: ValidationReport,
    },

    /// A package name was requested before metadata had been validated.
    #[error("cannot derive package name: {reason}")]
    Precondition {
        /// Description of the unmet precondition.
        reason: String,
    },

    /// An I/O operation on a specific file failed.
    #[error("I/O error at {}: {source}", .path.display())]
    FileIo {
        /// The file or directory being accessed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Recursive directory enumeration failed.
    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    /// JSON serialization of the checksum manifest failed.
    #[error("checksum manifest serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A file name cannot be recorded as a UTF-8 manifest key.
    #[error("path is not valid UTF-8: {}", .path.display())]
    NonUtf8Path {
        /// The offending path.
        path: PathBuf,
    },

    /// A string is not a well-formed SHA-256 digest.
    #[error("invalid SHA-256 digest: {reason}")]
    InvalidDigest {
        /// Why the digest was rejected.
        reason: String,
    },

    /// The finished archive could not be renamed to its final destination.
    #[error("failed to move archive into place at {}: {source}", .path.display())]
    Persist {
        /// Final destination of the archive.
        path: PathBuf,
        /// The underlying rename error.
        #[source]
        source: std::io::Error,
    },

    /// The requested compression algorithm is not supported.
    #[error("unknown compression algorithm \"{value}\"; expected one of: zstd, xz, gzip, none")]
    UnknownCompression {
        /// The rejected algorithm name.
        value: String,
    },

    /// The compression level is outside the algorithm's accepted range.
    #[error("compression level {level} is out of range for {algorithm} (expected {min}-{max})")]
    InvalidCompressionLevel {
        /// Algorithm the level was requested for.
        algorithm: Compression,
        /// The rejected level.
        level: u32,
        /// Lowest accepted level.
        min: u32,
        /// Highest accepted level.
        max: u32,
    },

    /// The configuration file could not be read or parsed.
    #[error("invalid configuration at {}: {reason}", .path.display())]
    Config {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// The user interrupted the build.
    #[error("build cancelled by user")]
    Interrupted,
}

impl PackagerError {
    /// Wrap an I/O error together with the path that produced it.
    #[must_use]
    pub fn file_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileIo {
            path: path.into(),
            source,
        }
    }

    /// Return the validation report when this error carries one.
    #[must_use]
    pub fn validation_report(&self) -> Option<&ValidationReport> {
        match self {
            Self::Validation { report } => Some(report),
            _ => None,
        }
    }
}

/// Result type alias using [`PackagerError`].
pub type Result<T> = std::result::Result<T, PackagerError>;
