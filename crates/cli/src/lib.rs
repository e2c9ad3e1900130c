//! Strato CLI library
//!
//! All CLI logic lives here so it stays reusable for testing; `main`
//! only parses arguments and formats the terminal error.

pub mod cmd;
pub mod command;
pub mod common;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use command::Command;
use common::RuntimeContext;

/// Strato - provisioning orchestrator for interdependent modules
#[derive(Parser)]
#[command(name = "strato")]
#[command(about = "Orchestrate provisioning of interdependent infrastructure modules")]
#[command(version)]
#[command(long_about = "Orchestrate provisioning of interdependent infrastructure modules.

Given a module declaration file, strato resolves the dependency graph,
provisions each dependency innermost-first, feeds captured outputs into
dependents as input variables, and finally runs the requested lifecycle
command on the root module.")]
pub struct Cli {
    /// Enable verbose output (shows DEBUG level logs)
    #[arg(short, long)]
    pub verbose: bool,

    /// Write logs to a file (useful for debugging)
    #[arg(long, env = "STRATO_LOG_FILE", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Maximum dependency traversal depth
    #[arg(long, value_name = "DEPTH", default_value_t = 2)]
    pub max_dependency_depth: usize,

    /// Provisioning tool binary to invoke
    #[arg(long, env = "STRATO_TERRAFORM_BIN", default_value = "terraform", value_name = "BIN")]
    pub terraform_bin: String,

    /// Lowercase and validate output names when parsing outputs
    #[arg(long)]
    pub decode_names: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for the strato CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Resolve dependencies and initialize the root module
    Init(cmd::init::InitCommand),

    /// Resolve dependencies and plan the root module
    Plan(cmd::plan::PlanCommand),

    /// Resolve dependencies and apply the root module
    Apply(cmd::apply::ApplyCommand),

    /// Resolve dependencies and destroy the root module
    Destroy(cmd::destroy::DestroyCommand),
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    strato_config::logging::init(cli.verbose, cli.log_file.as_deref())?;

    let context =
        RuntimeContext::new(cli.max_dependency_depth, cli.terraform_bin, cli.decode_names);

    match cli.command {
        Commands::Init(cmd) => cmd.execute(&context),
        Commands::Plan(cmd) => cmd.execute(&context),
        Commands::Apply(cmd) => cmd.execute(&context),
        Commands::Destroy(cmd) => cmd.execute(&context),
    }
}
