//! Error types for strato-config
//!
//! Configuration errors are always fatal and surface before any
//! provisioning runs. We use `thiserror` for structured error handling
//! with good error messages.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for strato-config operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for strato-config
#[derive(Error, Debug)]
pub enum Error {
    /// Error parsing a declaration file
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: hcl::Error,
    },

    /// A block attribute could not be evaluated to the expected type
    #[error("Invalid value for '{attribute}' in {path}: {message}")]
    InvalidValue {
        path: PathBuf,
        attribute: String,
        message: String,
    },

    /// A required block attribute is missing
    #[error("Missing required attribute '{attribute}' in {block} block of {path}")]
    MissingAttribute {
        path: PathBuf,
        block: String,
        attribute: String,
    },

    /// Hook declares neither a command nor a script
    #[error("Hook '{hook}' must set either 'command' or 'script'")]
    MissingCommand { hook: String },

    /// Hook declares both a command and a script
    #[error("Hook '{hook}' cannot set both 'command' and 'script'")]
    ConflictingCommand { hook: String },

    /// Hook trigger is not a recognized phase or phase:subcommand pair
    #[error("Hook '{hook}' has invalid trigger '{trigger}'")]
    InvalidTrigger { hook: String, trigger: String },

    /// The same dependency name is declared in two files
    #[error("Dependency '{name}' declared twice: in {} and {}", first.display(), second.display())]
    DuplicateDependency {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// No module block found for a file that needs provisioning
    #[error("No module block declared for {path}")]
    MissingModule { path: PathBuf },

    /// Error reading a declaration file
    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
