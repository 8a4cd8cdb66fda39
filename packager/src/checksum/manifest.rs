//! Checksum manifest schema.
//!
//! Serialised as `checksums.json` at the package root:
//!
//! ```json
//! {
//!   "generated_at": "2026-02-03T00:00:00Z",
//!   "generator_version": "apg-packager 0.1.0",
//!   "files": {
//!     "data/usr/bin/foo": {
//!       "digest": "...",
//!       "computed_at": "2026-02-03T00:00:00Z"
//!     }
//!   }
//! }
//! ```

use super::sha256_digest::Sha256Digest;
use crate::timestamp::Timestamp;
use crate::{PACKAGER_NAME, PACKAGER_VERSION};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Digest of one packaged file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksumEntry {
    /// SHA-256 of the file contents.
    pub digest: Sha256Digest,
    /// When the digest was computed.
    pub computed_at: Timestamp,
}

/// Per-file digests for a package tree, keyed by `/`-separated relative
/// path.
///
/// Keys are kept sorted so the serialised manifest is stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksumManifest {
    generated_at: Timestamp,
    generator_version: String,
    files: BTreeMap<String, ChecksumEntry>,
}

impl ChecksumManifest {
    /// Create an empty manifest stamped with the current time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            generated_at: Timestamp::now(),
            generator_version: format!("{PACKAGER_NAME} {PACKAGER_VERSION}"),
            files: BTreeMap::new(),
        }
    }

    /// Record the digest for `path`, replacing any previous entry.
    pub fn insert(&mut self, path: impl Into<String>, digest: Sha256Digest) {
        self.files.insert(
            path.into(),
            ChecksumEntry {
                digest,
                computed_at: Timestamp::now(),
            },
        );
    }

    /// Return the entry for `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&ChecksumEntry> {
        self.files.get(path)
    }

    /// Return the number of files recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Return true when no files were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate over recorded paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Iterate over `(path, digest)` pairs in sorted order.
    pub fn digests(&self) -> impl Iterator<Item = (&str, &Sha256Digest)> {
        self.files
            .iter()
            .map(|(path, entry)| (path.as_str(), &entry.digest))
    }

    /// Return when the manifest was created.
    #[must_use]
    pub fn generated_at(&self) -> &Timestamp {
        &self.generated_at
    }

    /// Return the tool name and version that produced the manifest.
    #[must_use]
    pub fn generator_version(&self) -> &str {
        &self.generator_version
    }
}

impl Default for ChecksumManifest {
    fn default() -> Self {
        Self::new()
    }
}
