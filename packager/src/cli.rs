//! CLI argument definitions for the APG packager.
//!
//! Parsing lives in the library so it can be unit tested; the binary only
//! wires the parsed [`Cli`] to the [`crate::pipeline::Pipeline`].

use crate::archive::Compression;
use crate::config::PackagerConfig;
use crate::error::{PackagerError, Result};
use crate::pipeline::{BuildRequest, OutputTarget};
use clap::Parser;
use std::path::PathBuf;

/// Build an APG package from a source tree.
#[derive(Parser, Debug, Default)]
#[command(name = "apg-packager")]
#[command(version, about)]
#[command(long_about = concat!(
    "Build an APG package from a source tree.\n\n",
    "The tree is checked against the APG layout (see --structure), every ",
    "file is recorded in checksums.json, and the tree is archived as ",
    "NAME-VERSION-RELEASE-ARCH.apg using the fields of metadata.json.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Build into the current directory:\n",
    "    $ apg-packager ./foo\n\n",
    "  Build with xz into dist/:\n",
    "    $ apg-packager ./foo -d dist -c xz -l 9\n\n",
    "  Show the expected package layout:\n",
    "    $ apg-packager --structure\n\n",
    "CONFIGURATION:\n",
    "  Defaults are read from apg.toml in the working directory, or the file\n",
    "  given with --config. Command-line flags take precedence.\n\n",
    "LOGGING:\n",
    "  Set APG_LOG to a filter such as `debug` to override -v.",
))]
pub struct Cli {
    /// Package source tree.
    #[arg(value_name = "SOURCE_DIR", required_unless_present = "structure")]
    pub source_dir: Option<PathBuf>,

    /// Write the archive to exactly this path.
    #[arg(short, long, value_name = "FILE", conflicts_with = "output_dir")]
    pub output: Option<PathBuf>,

    /// Directory for the derived package filename [default: .].
    #[arg(short = 'd', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Compression algorithm: zstd, xz, gzip, or none [default: zstd].
    #[arg(short, long, value_name = "ALGORITHM")]
    pub compression: Option<Compression>,

    /// Compression level (zstd 1-19, xz and gzip 0-9).
    #[arg(short, long, value_name = "N")]
    pub level: Option<u32>,

    /// Read defaults from this TOML file instead of ./apg.toml.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Show informational progress messages.
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the expected package layout and exit.
    #[arg(long)]
    pub structure: bool,
}

impl Cli {
    /// Combine the parsed arguments with `config` into a build request.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::Precondition`] when no source directory was
    /// given, or a compression error when the resolved algorithm or level is
    /// invalid.
    pub fn build_request(&self, config: &PackagerConfig) -> Result<BuildRequest> {
        let source_dir = self
            .source_dir
            .clone()
            .ok_or_else(|| PackagerError::Precondition {
                reason: "no source directory given".to_owned(),
            })?;
        let compression = config.resolve_compression(self.compression, self.level)?;
        let output = match &self.output {
            Some(file) => OutputTarget::File(file.clone()),
            None => OutputTarget::Directory(config.resolve_output_dir(self.output_dir.as_deref())),
        };
        Ok(BuildRequest {
            source_dir,
            output,
            compression,
        })
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
