//! Package archive creation.
//!
//! # Sub-modules
//!
//! - [`builder`] - Tree walk, tar encoding, and atomic rename
//!   (`ArchiveBuilder`).
//! - [`compression`] - Algorithm and level selection (`Compression`,
//!   `CompressionConfig`).

pub mod builder;
pub mod compression;

pub use builder::ArchiveBuilder;
pub(crate) use builder::resolve_destination;
pub use compression::{Compression, CompressionConfig};
