//! SHA-256 digest newtype.
//!
//! A digest is a 64-character lowercase hexadecimal string.

use crate::error::{PackagerError, Result};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use sha2::digest::Output;
use std::fmt;

const DIGEST_HEX_LEN: usize = 64;

/// A validated hex-encoded SHA-256 digest.
///
/// # Examples
///
/// ```
/// use apg_packager::checksum::Sha256Digest;
///
/// let hex = "a".repeat(64);
/// let digest = Sha256Digest::try_from(hex.as_str()).expect("valid digest");
/// assert_eq!(digest.as_str().len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Encode a finished hasher output.
    pub(crate) fn from_output(output: &Output<Sha256>) -> Self {
        Self(format!("{output:x}"))
    }

    /// Return the digest as a hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Sha256Digest {
    type Error = PackagerError;

    fn try_from(value: &str) -> Result<Self> {
        validate_sha256(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for Sha256Digest {
    type Error = PackagerError;

    fn try_from(value: String) -> Result<Self> {
        validate_sha256(&value)?;
        Ok(Self(value))
    }
}

impl From<Sha256Digest> for String {
    fn from(digest: Sha256Digest) -> Self {
        digest.0
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn validate_sha256(value: &str) -> Result<()> {
    if value.len() != DIGEST_HEX_LEN {
        return Err(PackagerError::InvalidDigest {
            reason: format!(
                "expected {DIGEST_HEX_LEN} hex characters, got {}",
                value.len()
            ),
        });
    }
    if let Some(bad) = value
        .chars()
        .find(|c| !c.is_ascii_digit() && !('a'..='f').contains(c))
    {
        return Err(PackagerError::InvalidDigest {
            reason: format!("'{bad}' is not a lowercase hex digit"),
        });
    }
    Ok(())
}
