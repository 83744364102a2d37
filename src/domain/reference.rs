//! Reference id newtype for the human-shareable certificate code.
//!
//! A reference id has the shape `CSAC<year>-` followed by five characters
//! drawn from `[0-9A-Z]`, e.g. `CSAC2026-7KQ2M`. The newtype prevents
//! arbitrary strings from flowing into store lookups as validated ids.

use crate::errors::CertforgeError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed prefix shared by every reference id, ahead of the issue year.
pub const REFERENCE_PREFIX: &str = "CSAC";

/// Number of random characters after the `CSAC<year>-` prefix.
pub const SUFFIX_LEN: usize = 5;

/// Alphabet the random suffix is drawn from (36 symbols, ~60M codes).
pub const SUFFIX_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

static REFERENCE_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^CSAC\d{4}-[0-9A-Z]{5}$").expect("reference id pattern is valid"));

/// Validated reference id for a certificate record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceId(String);

impl ReferenceId {
    /// Build a reference id from an issue year and a drawn suffix.
    pub(crate) fn compose(year: i32, suffix: &str) -> Self {
        Self(format!("{}{}-{}", REFERENCE_PREFIX, year, suffix))
    }

    /// Create an id from an existing string without validation (for rows
    /// read back from a store, which only ever holds ids we issued).
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    /// Parse and validate a reference id string.
    pub fn parse(s: &str) -> Result<Self, CertforgeError> {
        if REFERENCE_ID_PATTERN.is_match(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(CertforgeError::validation_field(
                format!("'{}' is not a valid reference id", s),
                "reference_id",
            ))
        }
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to inner string value
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ReferenceId {
    type Err = CertforgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for ReferenceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<ReferenceId> for String {
    fn from(id: ReferenceId) -> Self {
        id.0
    }
}
