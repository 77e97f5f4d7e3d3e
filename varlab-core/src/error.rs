//! Engine-level error taxonomy.
//!
//! Insufficient data is not an error here: it is reported as
//! [`Winner::InsufficientData`](crate::Winner::InsufficientData) so polling
//! dashboards can render it without tripping error handling.

use thiserror::Error;

use crate::storage;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, ExperimentError>;

/// Errors surfaced by the experiment engine.
#[derive(Debug, Error)]
pub enum ExperimentError {
    /// The caller sent something the engine cannot act on. Never retried.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The backing store failed. Safe to retry with backoff.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] storage::Error),
}

impl ExperimentError {
    /// Build an [`ExperimentError::InvalidInput`].
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether a caller may retry the failed operation.
    ///
    /// Tracking is idempotent, so retrying a write that actually landed
    /// before the failure was observed is harmless.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_is_not_retryable() {
        let err = ExperimentError::invalid("negative user id: -1");

        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "invalid input: negative user id: -1");
    }

    #[test]
    fn storage_errors_are_retryable() {
        let err: ExperimentError = storage::Error::InvalidData("bad row".into()).into();

        assert!(err.is_retryable());
        assert!(err.to_string().starts_with("storage unavailable"));
    }
}
