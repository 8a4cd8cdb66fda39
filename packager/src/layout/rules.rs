//! The APG package rule table.
//!
//! Each [`PathRule`] describes one required path relative to the package
//! root: what kind of filesystem entry it must be, whether it must carry the
//! execute bit, and whether its contents must be a JSON object with a fixed
//! set of keys. The table is a plain ordered slice so that validation order,
//! and therefore report order, never changes between runs.

use std::fmt;

/// Package metadata document consumed by the package namer.
pub const METADATA_FILE: &str = "metadata.json";

/// Package manifest document listing files and install/remove scripts.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Keys every `metadata.json` must contain, in report order.
pub const METADATA_FIELDS: &[&str] = &["name", "version", "release", "architecture"];

/// Keys every `manifest.json` must contain, in report order.
pub const MANIFEST_FIELDS: &[&str] = &["files", "scripts"];

/// The kind of filesystem entry a rule expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    /// A regular file.
    File,
    /// A directory.
    Directory,
}

impl PathKind {
    /// Return the lowercase noun used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "directory",
        }
    }
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON content constraint attached to a file rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonRule {
    /// Keys the top-level JSON object must contain.
    pub required_fields: &'static [&'static str],
}

/// A single entry of the package rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathRule {
    /// Path relative to the package root, `/`-separated.
    pub path: &'static str,
    /// Whether the path must exist.
    pub required: bool,
    /// Expected filesystem entry kind.
    pub kind: PathKind,
    /// Whether the entry must be executable.
    pub executable: bool,
    /// Optional JSON content constraint.
    pub json: Option<JsonRule>,
    /// Human-readable purpose shown by `--structure`.
    pub description: &'static str,
}

impl PathRule {
    const fn file(path: &'static str, description: &'static str) -> Self {
        Self {
            path,
            required: true,
            kind: PathKind::File,
            executable: false,
            json: None,
            description,
        }
    }

    const fn directory(path: &'static str, description: &'static str) -> Self {
        Self {
            path,
            required: true,
            kind: PathKind::Directory,
            executable: false,
            json: None,
            description,
        }
    }

    const fn json(
        path: &'static str,
        required_fields: &'static [&'static str],
        description: &'static str,
    ) -> Self {
        Self {
            json: Some(JsonRule { required_fields }),
            ..Self::file(path, description)
        }
    }

    const fn script(path: &'static str, description: &'static str) -> Self {
        Self {
            executable: true,
            ..Self::file(path, description)
        }
    }
}

/// The APG layout contract, in validation order.
pub const APG_RULES: &[PathRule] = &[
    PathRule::json(
        METADATA_FILE,
        METADATA_FIELDS,
        "package name, version, release, and architecture",
    ),
    PathRule::json(
        MANIFEST_FILE,
        MANIFEST_FIELDS,
        "list of packaged files and install/remove scripts",
    ),
    PathRule::directory("data", "payload installed onto the target system"),
    PathRule::directory("scripts", "install and remove hooks"),
    PathRule::script("scripts/preinstall", "runs before the payload is installed"),
    PathRule::script("scripts/postinstall", "runs after the payload is installed"),
    PathRule::script("scripts/preremove", "runs before the payload is removed"),
    PathRule::script("scripts/postremove", "runs after the payload is removed"),
];

/// Render a human-readable description of `rules`.
///
/// Used by `--structure`; touches no filesystem state.
///
/// # Examples
///
/// ```
/// use apg_packager::layout::{APG_RULES, describe_rules};
///
/// let text = describe_rules(APG_RULES);
/// assert!(text.contains("metadata.json"));
/// assert!(text.contains("scripts/postinstall"));
/// ```
#[must_use]
pub fn describe_rules(rules: &[PathRule]) -> String {
    let mut out = String::from("Expected APG package structure:\n\n");
    for rule in rules {
        let mut flags = vec![rule.kind.as_str()];
        if rule.required {
            flags.push("required");
        } else {
            flags.push("optional");
        }
        if rule.executable {
            flags.push("executable");
        }
        if rule.json.is_some() {
            flags.push("JSON");
        }
        let display_path = match rule.kind {
            PathKind::Directory => format!("{}/", rule.path),
            PathKind::File => rule.path.to_owned(),
        };
        out.push_str(&format!(
            "  {display_path:<22} [{}] {}\n",
            flags.join(", "),
            rule.description
        ));
        if let Some(json) = rule.json {
            out.push_str(&format!(
                "  {:<22} required keys: {}\n",
                "",
                json.required_fields.join(", ")
            ));
        }
    }
    out
}
