//! Package layout contract and structure validation.
//!
//! # Sub-modules
//!
//! - [`rules`] - The ordered, immutable rule table (`PathRule`, `APG_RULES`).
//! - [`validation`] - The structure validator and its report types.

pub mod rules;
pub mod validation;

pub use rules::{APG_RULES, JsonRule, METADATA_FILE, PathKind, PathRule, describe_rules};
pub use validation::{
    ValidationOutcome, ValidationReport, Violation, ViolationClass, validate, validate_package,
};
