//! Common utilities and types shared across CLI commands

use anyhow::{Context, Result};
use std::path::Path;
use strato_config::LifecycleCommand;
use strato_core::CancelToken;
use strato_engine::{Processor, Resolver, Terraform};

/// Runtime context for CLI commands
///
/// Consolidates the flags every subcommand needs: the depth bound, the
/// provisioning binary, and the cancellation token threaded through
/// every subprocess the run spawns.
#[derive(Debug, Clone)]
pub struct RuntimeContext {
    /// Maximum dependency traversal depth
    pub max_depth: usize,

    /// Provisioning tool binary name or path
    pub terraform_bin: String,

    /// Lowercase and validate output names when parsing
    pub decode_names: bool,

    /// Cancellation token for the whole run
    pub cancel: CancelToken,
}

impl RuntimeContext {
    /// Create a context from parsed global flags
    #[must_use]
    pub fn new(max_depth: usize, terraform_bin: String, decode_names: bool) -> Self {
        Self {
            max_depth,
            terraform_bin,
            decode_names,
            cancel: CancelToken::new(),
        }
    }

    /// Resolve the graph rooted at `file` and run `command` on the root
    ///
    /// `init_args` are forwarded to every `init` invocation (backend
    /// configuration flags and the like).
    pub fn run_lifecycle(
        &self,
        file: &Path,
        command: LifecycleCommand,
        init_args: Vec<String>,
    ) -> Result<()> {
        tracing::info!(
            file = %file.display(),
            command = command.name(),
            max_depth = self.max_depth,
            "Starting resolution"
        );

        let terraform = Terraform::new(&self.terraform_bin);
        let processor = Processor::new(terraform, self.cancel.clone())
            .with_init_args(init_args)
            .with_decode_names(self.decode_names);
        Resolver::new(&processor, command, self.max_depth)
            .resolve(file)
            .with_context(|| format!("Failed to {} {}", command.name(), file.display()))
    }
}
