//! Structure validation for APG package trees.
//!
//! The validator walks the rule table once, in order, and records every
//! violation it finds. It never stops at the first problem, so a single run
//! reports everything that is wrong with a tree. The only state it carries
//! forward is the parsed `metadata.json` document, which the package namer
//! consumes once validation has succeeded.

use super::rules::{APG_RULES, JsonRule, METADATA_FILE, PathKind, PathRule};
use crate::error::{PackagerError, Result};
use log::debug;
use serde_json::Value;
use std::fmt;
use std::fs::{self, Metadata};
use std::io::ErrorKind;
use std::path::Path;

/// Broad category of a [`Violation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationClass {
    /// Missing path, wrong entry kind, or missing execute permission.
    Structural,
    /// Malformed JSON, missing keys, or unreadable content.
    Content,
}

/// A single breach of the package layout contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A required path does not exist.
    Missing {
        /// Path relative to the package root.
        path: String,
        /// The kind of entry that was expected.
        kind: PathKind,
    },

    /// A path exists but is the wrong kind of entry.
    WrongKind {
        /// Path relative to the package root.
        path: String,
        /// The kind the rule requires.
        expected: PathKind,
        /// What was found instead.
        found: &'static str,
    },

    /// A path that must be executable lacks every execute bit.
    NotExecutable {
        /// Path relative to the package root.
        path: String,
    },

    /// A JSON document did not parse, or is not a JSON object.
    MalformedJson {
        /// Path relative to the package root.
        path: String,
        /// Parser message.
        reason: String,
    },

    /// A JSON document lacks one or more required keys.
    MissingFields {
        /// Path relative to the package root.
        path: String,
        /// Absent keys, in the rule's declared order.
        fields: Vec<String>,
    },

    /// A path exists but could not be inspected or read.
    Unreadable {
        /// Path relative to the package root.
        path: String,
        /// Description of the I/O failure.
        reason: String,
    },
}

impl Violation {
    /// Return the package-relative path this violation refers to.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Missing { path, .. }
            | Self::WrongKind { path, .. }
            | Self::NotExecutable { path }
            | Self::MalformedJson { path, .. }
            | Self::MissingFields { path, .. }
            | Self::Unreadable { path, .. } => path,
        }
    }

    /// Classify the violation as structural or content-related.
    #[must_use]
    pub const fn class(&self) -> ViolationClass {
        match self {
            Self::Missing { .. } | Self::WrongKind { .. } | Self::NotExecutable { .. } => {
                ViolationClass::Structural
            }
            Self::MalformedJson { .. } | Self::MissingFields { .. } | Self::Unreadable { .. } => {
                ViolationClass::Content
            }
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { path, kind } => write!(f, "missing required {kind}: {path}"),
            Self::WrongKind {
                path,
                expected,
                found,
            } => write!(f, "{path}: expected a {expected}, found a {found}"),
            Self::NotExecutable { path } => write!(f, "{path}: not executable"),
            Self::MalformedJson { path, reason } => write!(f, "{path}: malformed JSON: {reason}"),
            Self::MissingFields { path, fields } => {
                write!(f, "{path}: missing required field(s): {}", fields.join(", "))
            }
            Self::Unreadable { path, reason } => write!(f, "{path}: unreadable: {reason}"),
        }
    }
}

/// Every violation found by one validation pass, in rule-table order.
///
/// An empty report means the tree satisfies the layout contract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    /// Return true when no violations were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Return the number of violations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Return the violations in the order they were found.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Iterate over the violations.
    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.violations.iter()
    }

    /// Count violations belonging to `class`.
    #[must_use]
    pub fn count_class(&self, class: ViolationClass) -> usize {
        self.violations.iter().filter(|v| v.class() == class).count()
    }

    fn push(&mut self, violation: Violation) {
        debug!("layout violation: {violation}");
        self.violations.push(violation);
    }
}

impl From<Vec<Violation>> for ValidationReport {
    fn from(violations: Vec<Violation>) -> Self {
        Self { violations }
    }
}

impl<'a> IntoIterator for &'a ValidationReport {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, violation) in self.violations.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "  - {violation}")?;
        }
        Ok(())
    }
}

/// The result of validating a package tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationOutcome {
    /// Every violation found.
    pub report: ValidationReport,
    /// The parsed `metadata.json` object, when it parsed successfully.
    pub metadata: Option<Value>,
}

impl ValidationOutcome {
    /// Return true when the tree satisfies every rule.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.report.is_empty()
    }

    /// Convert the outcome into the retained metadata document.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::Validation`] when any violation was recorded,
    /// or [`PackagerError::Precondition`] when the rule table never retained
    /// a metadata document.
    pub fn into_metadata(self) -> Result<Value> {
        if !self.report.is_empty() {
            return Err(PackagerError::Validation {
                report: self.report,
            });
        }
        self.metadata.ok_or_else(|| PackagerError::Precondition {
            reason: format!("{METADATA_FILE} was not validated"),
        })
    }
}

/// Validate `root` against the APG rule table.
#[must_use]
pub fn validate_package(root: &Path) -> ValidationOutcome {
    validate(root, APG_RULES)
}

/// Validate `root` against `rules`.
///
/// Walks the whole table, in order, and never short-circuits.
#[must_use]
pub fn validate(root: &Path, rules: &[PathRule]) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::default();
    for rule in rules {
        check_rule(root, rule, &mut outcome);
    }
    debug!(
        "validated {} rule(s) under {}: {} violation(s)",
        rules.len(),
        root.display(),
        outcome.report.len()
    );
    outcome
}

fn check_rule(root: &Path, rule: &PathRule, outcome: &mut ValidationOutcome) {
    let full_path = root.join(rule.path);
    let metadata = match fs::metadata(&full_path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            if rule.required {
                outcome.report.push(Violation::Missing {
                    path: rule.path.to_owned(),
                    kind: rule.kind,
                });
            }
            return;
        }
        Err(err) => {
            outcome.report.push(Violation::Unreadable {
                path: rule.path.to_owned(),
                reason: err.to_string(),
            });
            return;
        }
    };

    let kind_matches = match rule.kind {
        PathKind::File => metadata.is_file(),
        PathKind::Directory => metadata.is_dir(),
    };
    if !kind_matches {
        outcome.report.push(Violation::WrongKind {
            path: rule.path.to_owned(),
            expected: rule.kind,
            found: describe_entry(&metadata),
        });
    }

    if rule.executable && !is_executable(&metadata) {
        outcome.report.push(Violation::NotExecutable {
            path: rule.path.to_owned(),
        });
    }

    if let Some(json) = rule.json
        && kind_matches
    {
        check_json(&full_path, rule, json, outcome);
    }
}

fn check_json(full_path: &Path, rule: &PathRule, json: JsonRule, outcome: &mut ValidationOutcome) {
    let contents = match fs::read_to_string(full_path) {
        Ok(contents) => contents,
        Err(err) => {
            outcome.report.push(Violation::Unreadable {
                path: rule.path.to_owned(),
                reason: err.to_string(),
            });
            return;
        }
    };

    let document: Value = match serde_json::from_str(&contents) {
        Ok(document) => document,
        Err(err) => {
            outcome.report.push(Violation::MalformedJson {
                path: rule.path.to_owned(),
                reason: err.to_string(),
            });
            return;
        }
    };

    let Some(object) = document.as_object() else {
        outcome.report.push(Violation::MalformedJson {
            path: rule.path.to_owned(),
            reason: "top-level value is not a JSON object".to_owned(),
        });
        return;
    };

    let missing: Vec<String> = json
        .required_fields
        .iter()
        .filter(|field| !object.contains_key(**field))
        .map(|field| (*field).to_owned())
        .collect();
    if !missing.is_empty() {
        outcome.report.push(Violation::MissingFields {
            path: rule.path.to_owned(),
            fields: missing,
        });
    }

    if rule.path == METADATA_FILE {
        outcome.metadata = Some(document);
    }
}

fn describe_entry(metadata: &Metadata) -> &'static str {
    if metadata.is_file() {
        "file"
    } else if metadata.is_dir() {
        "directory"
    } else {
        "special file"
    }
}

#[cfg(unix)]
fn is_executable(metadata: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;

    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &Metadata) -> bool {
    true
}

#[cfg(test)]
#[path = "validation_tests.rs"]
mod tests;
