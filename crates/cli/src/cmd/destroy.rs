//! Destroy command: resolve dependencies and destroy the root module

use crate::command::Command;
use crate::common::RuntimeContext;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use strato_config::LifecycleCommand;

/// Destroy the root module after resolving its dependencies
///
/// Dependencies are resolved so their outputs can still feed the root
/// module's inputs; they are not themselves destroyed.
#[derive(Debug, Args)]
pub struct DestroyCommand {
    /// Module declaration file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Extra arguments forwarded to the provisioning tool's init
    #[arg(last = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

impl Command for DestroyCommand {
    type Output = ();

    fn execute(&self, context: &RuntimeContext) -> Result<()> {
        context.run_lifecycle(&self.file, LifecycleCommand::Destroy, self.args.clone())
    }
}
