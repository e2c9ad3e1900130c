//! Command trait for strato CLI
//!
//! Every subcommand implements [`Command`]: it receives the shared
//! [`RuntimeContext`] and returns a terminal result. Keeping the
//! surface uniform keeps subcommands trivially testable.

use crate::common::RuntimeContext;
use anyhow::Result;

/// Trait for all strato commands
pub trait Command {
    /// The type returned by this command
    ///
    /// Most commands return `()`.
    type Output;

    /// Execute the command with the given runtime context
    fn execute(&self, context: &RuntimeContext) -> Result<Self::Output>;
}
