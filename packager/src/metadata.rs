//! Typed view of the package metadata document.

use crate::error::{PackagerError, Result};
use crate::layout::METADATA_FILE;
use serde_json::Value;

/// The four identity fields of `metadata.json`.
///
/// Fields may be JSON strings or numbers; numbers are kept in their decimal
/// text form so `"release": 1` and `"release": "1"` name the same package.
///
/// # Examples
///
/// ```
/// use apg_packager::metadata::PackageMetadata;
/// use serde_json::json;
///
/// let doc = json!({"name": "foo", "version": "1.0", "release": 1, "architecture": "x86_64"});
/// let metadata = PackageMetadata::try_from(&doc).expect("valid metadata");
/// assert_eq!(metadata.release, "1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    /// Package name.
    pub name: String,
    /// Upstream version.
    pub version: String,
    /// Package release number.
    pub release: String,
    /// Target architecture.
    pub architecture: String,
}

impl TryFrom<&Value> for PackageMetadata {
    type Error = PackagerError;

    fn try_from(document: &Value) -> Result<Self> {
        Ok(Self {
            name: field(document, "name")?,
            version: field(document, "version")?,
            release: field(document, "release")?,
            architecture: field(document, "architecture")?,
        })
    }
}

fn field(document: &Value, key: &str) -> Result<String> {
    let text = match document.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(_) => {
            return Err(PackagerError::Precondition {
                reason: format!("{METADATA_FILE} field \"{key}\" must be a string or number"),
            });
        }
        None => {
            return Err(PackagerError::Precondition {
                reason: format!("{METADATA_FILE} has no \"{key}\" field"),
            });
        }
    };
    if text.is_empty() {
        return Err(PackagerError::Precondition {
            reason: format!("{METADATA_FILE} field \"{key}\" is empty"),
        });
    }
    if !is_path_safe(&text) {
        return Err(PackagerError::Precondition {
            reason: format!(
                "{METADATA_FILE} field \"{key}\" must not contain path separators: {text:?}"
            ),
        });
    }
    Ok(text)
}

/// Reject values that would move the archive out of its output directory.
fn is_path_safe(text: &str) -> bool {
    text != "." && text != ".." && !text.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn extracts_string_fields() {
        let doc = json!({
            "name": "foo",
            "version": "1.0",
            "release": "1",
            "architecture": "x86_64",
            "description": "ignored"
        });
        let metadata = PackageMetadata::try_from(&doc).expect("valid metadata");
        assert_eq!(
            metadata,
            PackageMetadata {
                name: "foo".to_owned(),
                version: "1.0".to_owned(),
                release: "1".to_owned(),
                architecture: "x86_64".to_owned(),
            }
        );
    }

    #[rstest]
    #[case::integer(json!(3), "3")]
    #[case::float(json!(2.5), "2.5")]
    fn renders_numbers_as_decimal_text(#[case] release: Value, #[case] expected: &str) {
        let doc = json!({"name": "foo", "version": "1.0", "release": release, "architecture": "noarch"});
        let metadata = PackageMetadata::try_from(&doc).expect("valid metadata");
        assert_eq!(metadata.release, expected);
    }

    #[rstest]
    #[case::missing(json!({"name": "foo", "version": "1.0", "release": "1"}), "architecture")]
    #[case::boolean(json!({"name": true, "version": "1.0", "release": "1", "architecture": "x"}), "name")]
    #[case::null(json!({"name": "foo", "version": null, "release": "1", "architecture": "x"}), "version")]
    #[case::empty(json!({"name": "foo", "version": "1.0", "release": "", "architecture": "x"}), "release")]
    fn rejects_unusable_fields(#[case] doc: Value, #[case] key: &str) {
        let err = PackageMetadata::try_from(&doc).expect_err("must reject");
        assert!(matches!(err, PackagerError::Precondition { .. }));
        assert!(err.to_string().contains(key), "{err}");
    }

    #[rstest]
    #[case::parent_dir("../escaped")]
    #[case::nested("a/b")]
    #[case::backslash("a\\b")]
    #[case::nul("foo\0")]
    #[case::dot(".")]
    #[case::dot_dot("..")]
    fn rejects_values_that_are_not_file_name_safe(#[case] name: &str) {
        let doc = json!({"name": name, "version": "1.0", "release": "1", "architecture": "x86_64"});
        let err = PackageMetadata::try_from(&doc).expect_err("must reject");
        assert!(matches!(err, PackagerError::Precondition { .. }));
        assert!(err.to_string().contains("\"name\""), "{err}");
    }

    #[test]
    fn accepts_dots_inside_values() {
        let doc = json!({"name": "foo..bar", "version": "1.0.2", "release": "1", "architecture": "x86_64"});
        let metadata = PackageMetadata::try_from(&doc).expect("valid metadata");
        assert_eq!(metadata.name, "foo..bar");
    }

    #[test]
    fn rejects_non_object_document() {
        let err = PackageMetadata::try_from(&json!(["foo"])).expect_err("must reject");
        assert!(matches!(err, PackagerError::Precondition { .. }));
    }
}
