//! Checksum manifest generation.
//!
//! Every regular file below the package root is hashed with SHA-256 and
//! recorded in `checksums.json` at the root. Symlinks are neither followed
//! nor hashed, and the manifest never lists itself, so regenerating it over
//! an unchanged tree yields the same digests.
//!
//! Keys are `/`-separated UTF-8 paths. A file name that is not valid UTF-8
//! aborts the pass rather than being recorded under a lossy key.
//!
//! # Sub-modules
//!
//! - [`manifest`] - Manifest schema (`ChecksumManifest`, `ChecksumEntry`).
//! - [`sha256_digest`] - SHA-256 digest newtype (`Sha256Digest`).

pub mod manifest;
pub mod sha256_digest;

pub use manifest::{ChecksumEntry, ChecksumManifest};
pub use sha256_digest::Sha256Digest;

use crate::error::{PackagerError, Result};
use crate::interrupt::{self, Interrupt};
use log::{debug, info};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File name of the checksum manifest, relative to the package root.
pub const CHECKSUM_FILE: &str = "checksums.json";

const READ_BUFFER_SIZE: usize = 8192;

/// Compute the SHA-256 digest of a file.
///
/// Reads the file at `path` in 8 KiB chunks.
///
/// # Errors
///
/// Returns [`PackagerError::FileIo`] if the file cannot be opened or read.
pub fn compute_sha256(path: &Path) -> Result<Sha256Digest> {
    let mut file = fs::File::open(path).map_err(|err| PackagerError::file_io(path, err))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; READ_BUFFER_SIZE];
    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|err| PackagerError::file_io(path, err))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(Sha256Digest::from_output(&hasher.finalize()))
}

/// A checksum pass over one package root.
///
/// Walks the tree in file-name order, hashes regular files only, and never
/// lists the root `checksums.json`. Paths passed to [`ChecksumScan::exclude`]
/// are left out as well, so an archive written into its own source tree is
/// not recorded in the manifest it ships with.
#[derive(Debug, Clone)]
pub struct ChecksumScan<'a> {
    root: &'a Path,
    interrupt: &'static Interrupt,
    excluded: Vec<PathBuf>,
}

impl<'a> ChecksumScan<'a> {
    /// Create a scan of `root` polling the process-wide interrupt flag.
    #[must_use]
    pub fn new(root: &'a Path) -> Self {
        Self {
            root,
            interrupt: interrupt::global(),
            excluded: Vec::new(),
        }
    }

    /// Poll `interrupt` instead of the process-wide flag.
    #[must_use]
    pub fn with_interrupt(mut self, interrupt: &'static Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Leave `path` out of the manifest.
    ///
    /// `path` is compared against the canonical form of each walked entry,
    /// so it should itself be absolute and canonical.
    #[must_use]
    pub fn exclude(mut self, path: impl Into<PathBuf>) -> Self {
        self.excluded.push(path.into());
        self
    }

    /// Hash every regular file under the root.
    ///
    /// # Errors
    ///
    /// Aborts on the first walk or read failure, with
    /// [`PackagerError::NonUtf8Path`] for a file name that cannot be
    /// recorded, and with [`PackagerError::Interrupted`] on cancellation.
    pub fn compute(&self) -> Result<ChecksumManifest> {
        self.compute_with(compute_sha256)
    }

    /// Hash every regular file under the root using `hash`.
    ///
    /// # Errors
    ///
    /// See [`ChecksumScan::compute`]; errors returned by `hash` abort the
    /// pass unchanged.
    pub fn compute_with<F>(&self, mut hash: F) -> Result<ChecksumManifest>
    where
        F: FnMut(&Path) -> Result<Sha256Digest>,
    {
        let root =
            fs::canonicalize(self.root).map_err(|err| PackagerError::file_io(self.root, err))?;
        let mut manifest = ChecksumManifest::new();
        let walker = WalkDir::new(&root).follow_links(false).sort_by_file_name();
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if self.excluded.iter().any(|excluded| excluded == path) {
                debug!("leaving {} out of the manifest", path.display());
                continue;
            }
            let Some(key) = manifest_key(&root, path)? else {
                continue;
            };
            if key == CHECKSUM_FILE {
                continue;
            }
            self.interrupt.check()?;
            let digest = hash(path)?;
            debug!("{key}: {digest}");
            manifest.insert(key, digest);
        }
        Ok(manifest)
    }

    /// Compute the manifest and write it to `checksums.json` under the root.
    ///
    /// Nothing is written when any file fails to hash.
    ///
    /// # Errors
    ///
    /// See [`ChecksumScan::compute`] and [`write_manifest`].
    pub fn generate(&self) -> Result<ChecksumManifest> {
        self.generate_with(compute_sha256)
    }

    /// [`ChecksumScan::generate`] with a caller-supplied hash function.
    ///
    /// # Errors
    ///
    /// See [`ChecksumScan::compute_with`] and [`write_manifest`].
    pub fn generate_with<F>(&self, hash: F) -> Result<ChecksumManifest>
    where
        F: FnMut(&Path) -> Result<Sha256Digest>,
    {
        let manifest = self.compute_with(hash)?;
        write_manifest(self.root, &manifest)?;
        info!(
            "wrote {} checksum(s) to {}",
            manifest.len(),
            self.root.join(CHECKSUM_FILE).display()
        );
        Ok(manifest)
    }
}

/// Hash every regular file under `root`.
///
/// # Errors
///
/// See [`ChecksumScan::compute`].
pub fn compute_checksums(root: &Path) -> Result<ChecksumManifest> {
    ChecksumScan::new(root).compute()
}

/// Write `manifest` to `checksums.json` under `root`, replacing any
/// existing file.
///
/// # Errors
///
/// Returns [`PackagerError::Serialization`] or [`PackagerError::FileIo`].
pub fn write_manifest(root: &Path, manifest: &ChecksumManifest) -> Result<()> {
    let mut json = serde_json::to_string_pretty(manifest)?;
    json.push('\n');
    let path = root.join(CHECKSUM_FILE);
    fs::write(&path, json).map_err(|err| PackagerError::file_io(&path, err))
}

/// Compute checksums for `root` and write the manifest into it.
///
/// # Errors
///
/// See [`ChecksumScan::generate`].
pub fn generate_checksums(root: &Path) -> Result<ChecksumManifest> {
    ChecksumScan::new(root).generate()
}

/// Render `path` relative to `root` with `/` separators.
///
/// Returns `Ok(None)` for `root` itself and for paths outside it.
pub(crate) fn manifest_key(root: &Path, path: &Path) -> Result<Option<String>> {
    let Ok(relative) = path.strip_prefix(root) else {
        return Ok(None);
    };
    let mut parts = Vec::new();
    for component in relative.components() {
        let part = component
            .as_os_str()
            .to_str()
            .ok_or_else(|| PackagerError::NonUtf8Path {
                path: path.to_path_buf(),
            })?;
        parts.push(part);
    }
    if parts.is_empty() {
        Ok(None)
    } else {
        Ok(Some(parts.join("/")))
    }
}

#[cfg(test)]
#[path = "checksum_tests.rs"]
mod tests;
