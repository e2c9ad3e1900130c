//! Error types for strato-shell

use thiserror::Error;

/// Result type alias for strato-shell operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for strato-shell
#[derive(Error, Debug)]
pub enum Error {
    /// The process could not be spawned
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process exited with a nonzero status
    ///
    /// Carries the captured error stream so callers can classify the
    /// failure after the fact.
    #[error("'{program}' exited with code {code}")]
    ExitStatus {
        program: String,
        code: i32,
        stderr: String,
    },

    /// The cancellation token tripped while the process was running
    #[error("'{program}' was cancelled")]
    Cancelled { program: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
