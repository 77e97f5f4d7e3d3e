//! Core identifier types for the experiment engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ExperimentError, Result};

/// Stable token identifying a variant in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantId(pub String);

impl VariantId {
    /// Create a variant ID from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VariantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of an already-authenticated user.
///
/// Always non-negative; construct through [`UserId::parse`] at the edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    /// Validate a raw integer id coming from a caller.
    pub fn parse(raw: i64) -> Result<Self> {
        u64::try_from(raw)
            .map(Self)
            .map_err(|_| ExperimentError::invalid(format!("negative user id: {raw}")))
    }

    /// The id as stored in the database.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        // parse() only admits values that came from an i64
        self.0 as i64
    }

    #[must_use]
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The entity an exposure concerns (a job, an email thread, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(pub i64);

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
