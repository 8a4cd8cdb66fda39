//! APG packager library.
//!
//! This crate validates a package source tree against the APG layout
//! contract, stamps it with a checksum manifest, and bundles it into a single
//! compressed `.apg` archive. It is used by the `apg-packager` CLI binary and
//! can be consumed programmatically for testing or custom build workflows.
//!
//! # Modules
//!
//! - [`archive`] - Compressed archive creation with atomic rename
//! - [`checksum`] - SHA-256 checksum manifest generation
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Optional `apg.toml` configuration
//! - [`error`] - Semantic error types
//! - [`interrupt`] - Cooperative cancellation on SIGINT
//! - [`layout`] - Package rule table and structure validation
//! - [`metadata`] - Typed view of `metadata.json`
//! - [`naming`] - Package filename policy
//! - [`pipeline`] - Build stage orchestration
//! - [`timestamp`] - ISO 8601 timestamps without a date library

pub mod archive;
pub mod checksum;
pub mod cli;
pub mod config;
pub mod error;
pub mod interrupt;
pub mod layout;
pub mod metadata;
pub mod naming;
pub mod pipeline;
pub mod timestamp;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Version string reported by `--version` and recorded in checksum manifests.
pub const PACKAGER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tool name recorded alongside [`PACKAGER_VERSION`].
pub const PACKAGER_NAME: &str = "apg-packager";
