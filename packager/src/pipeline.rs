//! Build stage orchestration.
//!
//! A build moves through [`BuildStage::Validating`],
//! [`BuildStage::ComputingChecksums`], and [`BuildStage::Archiving`] before
//! reaching [`BuildStage::Done`]. Each stage starts only after the previous
//! one succeeded; the first failure stops the run and is reported together
//! with the stage it happened in.
//!
//! A checksum manifest written before a failed archive stage is left in
//! place. When the archive destination lies inside the source tree it is
//! left out of both the manifest and the archive.

use crate::archive::{ArchiveBuilder, CompressionConfig, resolve_destination};
use crate::checksum::ChecksumScan;
use crate::error::{PackagerError, Result};
use crate::interrupt::{self, Interrupt};
use crate::layout::validate_package;
use crate::naming::{PackageName, derive_name};
use log::info;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The phase a build is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildStage {
    /// Checking the tree against the rule table and deriving the name.
    Validating,
    /// Writing `checksums.json`.
    ComputingChecksums,
    /// Writing and renaming the archive.
    Archiving,
    /// The archive is in place.
    Done,
}

impl BuildStage {
    /// Return a lowercase description for messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::ComputingChecksums => "computing checksums",
            Self::Archiving => "archiving",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the finished archive goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Write to exactly this path.
    File(PathBuf),
    /// Write `<package name>.apg` inside this directory.
    Directory(PathBuf),
}

impl OutputTarget {
    /// Resolve the archive path for `name`.
    #[must_use]
    pub fn archive_path(&self, name: &PackageName) -> PathBuf {
        match self {
            Self::File(path) => path.clone(),
            Self::Directory(dir) => dir.join(name.filename()),
        }
    }
}

/// Inputs for one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Root of the package tree.
    pub source_dir: PathBuf,
    /// Archive destination.
    pub output: OutputTarget,
    /// Archive compression.
    pub compression: CompressionConfig,
}

/// A successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
    /// Absolute path of the archive.
    pub archive_path: PathBuf,
    /// Package name derived from metadata.
    pub package_name: PackageName,
    /// Number of files recorded in `checksums.json`.
    pub checksum_count: usize,
}

/// A failed build: the stage that failed and why.
#[derive(Debug, Error)]
#[error("{stage}: {error}")]
pub struct BuildFailure {
    /// The stage that was running.
    pub stage: BuildStage,
    /// What went wrong.
    #[source]
    pub error: PackagerError,
}

impl BuildFailure {
    /// Return true when the user cancelled the build.
    #[must_use]
    pub const fn is_interrupted(&self) -> bool {
        matches!(self.error, PackagerError::Interrupted)
    }
}

/// Outcome of [`Pipeline::run`].
pub type BuildResult = std::result::Result<BuildOutput, BuildFailure>;

/// Runs builds and tracks the current stage.
#[derive(Debug)]
pub struct Pipeline {
    interrupt: &'static Interrupt,
    stage: BuildStage,
}

impl Pipeline {
    /// Create a pipeline polling the process-wide interrupt flag.
    #[must_use]
    pub fn new() -> Self {
        Self {
            interrupt: interrupt::global(),
            stage: BuildStage::Validating,
        }
    }

    /// Poll `interrupt` instead of the process-wide flag.
    #[must_use]
    pub const fn with_interrupt(mut self, interrupt: &'static Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Return the stage reached by the most recent run.
    #[must_use]
    pub const fn stage(&self) -> BuildStage {
        self.stage
    }

    /// Validate, checksum, and archive the requested tree.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildFailure`] naming the stage that failed. Validation
    /// failures carry the complete [`crate::layout::ValidationReport`].
    pub fn run(&mut self, request: &BuildRequest) -> BuildResult {
        let source = request.source_dir.as_path();

        self.enter(BuildStage::Validating)?;
        let name = self.attempt(validate(source))?;
        info!("validated {} as {name}", source.display());

        let destination = request.output.archive_path(&name);

        self.enter(BuildStage::ComputingChecksums)?;
        let mut scan = ChecksumScan::new(source).with_interrupt(self.interrupt);
        // An unresolvable destination fails in the archive stage instead.
        if let Ok(resolved) = resolve_destination(&destination) {
            scan = scan.exclude(resolved);
        }
        let checksums = self.attempt(scan.generate())?;

        self.enter(BuildStage::Archiving)?;
        let builder = ArchiveBuilder::new(request.compression).with_interrupt(self.interrupt);
        let archive_path = self.attempt(builder.build(source, &destination))?;

        self.stage = BuildStage::Done;
        info!("built {}", archive_path.display());
        Ok(BuildOutput {
            archive_path,
            package_name: name,
            checksum_count: checksums.len(),
        })
    }

    fn enter(&mut self, stage: BuildStage) -> std::result::Result<(), BuildFailure> {
        self.stage = stage;
        info!("{stage}");
        self.attempt(self.interrupt.check())
    }

    fn attempt<T>(&self, result: Result<T>) -> std::result::Result<T, BuildFailure> {
        result.map_err(|error| BuildFailure {
            stage: self.stage,
            error,
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn validate(source: &Path) -> Result<PackageName> {
    if !source.is_dir() {
        return Err(PackagerError::SourceNotFound {
            path: source.to_path_buf(),
        });
    }
    let metadata = validate_package(source).into_metadata()?;
    derive_name(Some(&metadata))
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
