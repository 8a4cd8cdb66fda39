//! Package naming policy.
//!
//! Archives are named `<name>-<version>-<release>-<architecture>.apg`, taken
//! verbatim from `metadata.json`.

use crate::error::{PackagerError, Result};
use crate::layout::METADATA_FILE;
use crate::metadata::PackageMetadata;
use serde_json::Value;
use std::fmt;

/// File extension for APG archives.
pub const PACKAGE_EXTENSION: &str = ".apg";

/// A package name derived from validated metadata.
///
/// # Examples
///
/// ```
/// use apg_packager::metadata::PackageMetadata;
/// use apg_packager::naming::PackageName;
///
/// let metadata = PackageMetadata {
///     name: "foo".to_owned(),
///     version: "1.0".to_owned(),
///     release: "1".to_owned(),
///     architecture: "x86_64".to_owned(),
/// };
/// let name = PackageName::new(&metadata);
/// assert_eq!(name.to_string(), "foo-1.0-1-x86_64");
/// assert_eq!(name.filename(), "foo-1.0-1-x86_64.apg");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageName(String);

impl PackageName {
    /// Build the name from metadata fields.
    #[must_use]
    pub fn new(metadata: &PackageMetadata) -> Self {
        Self(format!(
            "{}-{}-{}-{}",
            metadata.name, metadata.version, metadata.release, metadata.architecture
        ))
    }

    /// Return the name without extension.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the archive filename, including the `.apg` extension.
    #[must_use]
    pub fn filename(&self) -> String {
        format!("{}{PACKAGE_EXTENSION}", self.0)
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the package name from the metadata retained by validation.
///
/// # Errors
///
/// Returns [`PackagerError::Precondition`] when no metadata was retained, or
/// when a field is unusable.
pub fn derive_name(metadata: Option<&Value>) -> Result<PackageName> {
    let document = metadata.ok_or_else(|| PackagerError::Precondition {
        reason: format!("{METADATA_FILE} has not been validated"),
    })?;
    let metadata = PackageMetadata::try_from(document)?;
    Ok(PackageName::new(&metadata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::strings(
        json!({"name": "foo", "version": "1.0", "release": "1", "architecture": "x86_64"}),
        "foo-1.0-1-x86_64.apg"
    )]
    #[case::numeric_release(
        json!({"name": "libbar", "version": "2.3.4", "release": 7, "architecture": "aarch64"}),
        "libbar-2.3.4-7-aarch64.apg"
    )]
    #[case::hyphenated_name(
        json!({"name": "foo-utils", "version": "0.9", "release": "2", "architecture": "noarch"}),
        "foo-utils-0.9-2-noarch.apg"
    )]
    fn derives_filename_from_metadata(#[case] doc: Value, #[case] expected: &str) {
        let name = derive_name(Some(&doc)).expect("valid metadata");
        assert_eq!(name.filename(), expected);
    }

    #[test]
    fn absent_metadata_is_a_precondition_failure() {
        let err = derive_name(None).expect_err("no metadata");
        assert!(matches!(err, PackagerError::Precondition { .. }));
        assert!(err.to_string().contains("metadata.json"));
    }

    #[test]
    fn display_omits_extension() {
        let doc = json!({"name": "foo", "version": "1.0", "release": "1", "architecture": "x86_64"});
        let name = derive_name(Some(&doc)).expect("valid metadata");
        assert_eq!(name.as_str(), "foo-1.0-1-x86_64");
        assert_eq!(format!("{name}"), "foo-1.0-1-x86_64");
    }
}
