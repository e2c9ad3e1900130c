//! Plan command: resolve dependencies and plan the root module

use crate::command::Command;
use crate::common::RuntimeContext;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use strato_config::LifecycleCommand;

/// Plan the root module after resolving its dependencies
///
/// Dependencies are still provisioned; only the root module stops at
/// the plan step.
#[derive(Debug, Args)]
pub struct PlanCommand {
    /// Module declaration file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Extra arguments forwarded to the provisioning tool's init
    #[arg(last = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

impl Command for PlanCommand {
    type Output = ();

    fn execute(&self, context: &RuntimeContext) -> Result<()> {
        context.run_lifecycle(&self.file, LifecycleCommand::Plan, self.args.clone())
    }
}
