//! Streams a package tree into a compressed tar archive.

use super::compression::{Compression, CompressionConfig};
use crate::error::{PackagerError, Result};
use crate::interrupt::{self, Interrupt};
use log::{debug, info};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// Builds `.apg` archives with a fixed compression configuration.
///
/// The archive is written to a temporary file beside the destination and
/// renamed into place only once it is complete and synced to disk. Any
/// failure before the rename deletes the temporary file.
///
/// # Examples
///
/// ```no_run
/// use apg_packager::archive::{ArchiveBuilder, CompressionConfig};
/// use std::path::Path;
///
/// let builder = ArchiveBuilder::new(CompressionConfig::default());
/// let archive = builder
///     .build(Path::new("pkgroot"), Path::new("foo-1.0-1-x86_64.apg"))
///     .expect("archive written");
/// assert!(archive.is_file());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ArchiveBuilder {
    compression: CompressionConfig,
    interrupt: &'static Interrupt,
}

impl ArchiveBuilder {
    /// Create a builder polling the process-wide interrupt flag.
    #[must_use]
    pub fn new(compression: CompressionConfig) -> Self {
        Self {
            compression,
            interrupt: interrupt::global(),
        }
    }

    /// Poll `interrupt` instead of the process-wide flag.
    #[must_use]
    pub const fn with_interrupt(mut self, interrupt: &'static Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Return the compression configuration.
    #[must_use]
    pub const fn compression(&self) -> CompressionConfig {
        self.compression
    }

    /// Archive `source_root` into `destination`, replacing any existing file.
    ///
    /// Returns the absolute path of the finished archive.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::FileIo`] or [`PackagerError::Walk`] when the
    /// tree cannot be read or the archive cannot be written,
    /// [`PackagerError::Persist`] when the final rename fails, and
    /// [`PackagerError::Interrupted`] on cancellation.
    pub fn build(&self, source_root: &Path, destination: &Path) -> Result<PathBuf> {
        let root = fs::canonicalize(source_root)
            .map_err(|err| PackagerError::file_io(source_root, err))?;
        let destination = resolve_destination(destination)?;
        let parent = destination
            .parent()
            .ok_or_else(|| PackagerError::Precondition {
                reason: format!("{} has no parent directory", destination.display()),
            })?;

        let temp = NamedTempFile::new_in(parent).map_err(|err| PackagerError::file_io(parent, err))?;
        debug!(
            "writing {} archive to temporary file {}",
            self.compression,
            temp.path().display()
        );

        let skip = [destination.as_path(), temp.path()];
        let entries = self.write_tar(&root, temp.as_file(), &skip)?;
        temp.as_file()
            .sync_all()
            .map_err(|err| PackagerError::file_io(temp.path(), err))?;

        temp.persist(&destination)
            .map_err(|err| PackagerError::Persist {
                path: destination.clone(),
                source: err.error,
            })?;
        info!(
            "archived {entries} entries into {} ({})",
            destination.display(),
            self.compression
        );
        Ok(destination)
    }

    fn write_tar(&self, root: &Path, file: &File, skip: &[&Path]) -> Result<usize> {
        let encoder = Encoder::new(file, self.compression)
            .map_err(|err| PackagerError::file_io(root, err))?;
        let mut tar = tar::Builder::new(encoder);
        tar.follow_symlinks(false);

        let mut entries = 0;
        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .min_depth(1);
        for entry in walker {
            self.interrupt.check()?;
            let entry = entry?;
            let path = entry.path();
            if skip.contains(&path) {
                debug!("skipping {} inside source tree", path.display());
                continue;
            }
            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            tar.append_path_with_name(path, relative)
                .map_err(|err| PackagerError::file_io(path, err))?;
            entries += 1;
        }

        let encoder = tar
            .into_inner()
            .map_err(|err| PackagerError::file_io(root, err))?;
        encoder
            .finish()
            .map_err(|err| PackagerError::file_io(root, err))?;
        Ok(entries)
    }
}

/// Make `destination` absolute without requiring it to exist.
///
/// The parent directory is canonicalised, so the result compares equal to
/// the paths a walk of a canonical source root yields.
pub(crate) fn resolve_destination(destination: &Path) -> Result<PathBuf> {
    let file_name = destination
        .file_name()
        .ok_or_else(|| PackagerError::Precondition {
            reason: format!("{} does not name a file", destination.display()),
        })?;
    let parent = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let parent = fs::canonicalize(parent).map_err(|err| PackagerError::file_io(parent, err))?;
    Ok(parent.join(file_name))
}

/// The compressing writer underneath the tar stream.
enum Encoder<W: Write> {
    Zstd(zstd::Encoder<'static, W>),
    Xz(xz2::write::XzEncoder<W>),
    Gzip(flate2::write::GzEncoder<W>),
    None(BufWriter<W>),
}

impl<W: Write> Encoder<W> {
    fn new(inner: W, config: CompressionConfig) -> io::Result<Self> {
        Ok(match config.algorithm() {
            Compression::Zstd => {
                let level = i32::try_from(config.level()).map_err(io::Error::other)?;
                Self::Zstd(zstd::Encoder::new(inner, level)?)
            }
            Compression::Xz => Self::Xz(xz2::write::XzEncoder::new(inner, config.level())),
            Compression::Gzip => Self::Gzip(flate2::write::GzEncoder::new(
                inner,
                flate2::Compression::new(config.level()),
            )),
            Compression::None => Self::None(BufWriter::new(inner)),
        })
    }

    /// Flush the compressor trailer and return the underlying writer.
    fn finish(self) -> io::Result<W> {
        match self {
            Self::Zstd(encoder) => encoder.finish(),
            Self::Xz(encoder) => encoder.finish(),
            Self::Gzip(encoder) => encoder.finish(),
            Self::None(writer) => writer.into_inner().map_err(io::IntoInnerError::into_error),
        }
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Zstd(encoder) => encoder.write(buf),
            Self::Xz(encoder) => encoder.write(buf),
            Self::Gzip(encoder) => encoder.write(buf),
            Self::None(writer) => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Zstd(encoder) => encoder.flush(),
            Self::Xz(encoder) => encoder.flush(),
            Self::Gzip(encoder) => encoder.flush(),
            Self::None(writer) => writer.flush(),
        }
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
