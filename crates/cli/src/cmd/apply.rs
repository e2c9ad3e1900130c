//! Apply command: resolve dependencies and apply the root module

use crate::command::Command;
use crate::common::RuntimeContext;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use strato_config::LifecycleCommand;

/// Apply the root module after resolving its dependencies
#[derive(Debug, Args)]
pub struct ApplyCommand {
    /// Module declaration file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Extra arguments forwarded to the provisioning tool's init
    #[arg(last = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

impl Command for ApplyCommand {
    type Output = ();

    fn execute(&self, context: &RuntimeContext) -> Result<()> {
        context.run_lifecycle(&self.file, LifecycleCommand::Apply, self.args.clone())
    }
}
