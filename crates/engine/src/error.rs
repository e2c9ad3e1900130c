//! Error types for strato-engine

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for strato-engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for strato-engine
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error from strato-config
    #[error(transparent)]
    Config(#[from] strato_config::Error),

    /// Subprocess error from strato-shell
    #[error(transparent)]
    Shell(#[from] strato_shell::Error),

    /// The dependency graph contains a back-edge to a module on the
    /// active path
    #[error("Cyclic dependency: {chain}")]
    CyclicDependency { chain: String },

    /// The dependency chain is deeper than the configured bound
    #[error("Dependency chain exceeds max depth {max_depth}: {chain}")]
    MaxDepthExceeded { chain: String, max_depth: usize },

    /// A hook invocation failed
    #[error("Hook '{hook}' failed: {source}")]
    Hook {
        hook: String,
        #[source]
        source: strato_shell::Error,
    },

    /// A hook's command string could not be split into words
    #[error("Hook '{hook}' has an unparseable command: {source}")]
    HookCommand {
        hook: String,
        #[source]
        source: shell_words::ParseError,
    },

    /// The structured output stream was not valid JSON
    #[error("Failed to parse provisioning output for '{module}': {source}")]
    OutputParse {
        module: String,
        #[source]
        source: serde_json::Error,
    },

    /// An output entry was not a `{type, value}` object
    #[error("Malformed output entry '{name}' from '{module}': no value")]
    MalformedOutput { module: String, name: String },

    /// An output name failed validation in decode-names mode
    #[error("Invalid output name '{name}' from '{module}'")]
    InvalidOutputName { module: String, name: String },

    /// The generated module invocation file could not be written
    #[error("Failed to write generated file {path}: {source}")]
    GeneratedFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A value could not be encoded into the generated file
    #[error("Failed to encode generated module file: {0}")]
    Encode(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
