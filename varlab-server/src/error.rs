//! Server error types

use thiserror::Error;
use varlab_core::ExperimentError;

/// Errors that can occur while starting or running the server
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified address
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The experiment engine could not be set up
    #[error("experiment engine: {0}")]
    Engine(#[from] ExperimentError),

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}
