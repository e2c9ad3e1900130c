//! Dependency processor
//!
//! Provisions one module in its exclusive working directory: writes the
//! generated module invocation file, fires matching hooks, drives the
//! provisioning tool's lifecycle, and extracts typed output values.
//! The resolver talks to this through the [`ModuleProcessor`] trait so
//! graph behavior can be tested without spawning processes.

use crate::error::{Error, Result};
use crate::hooks::HookRunner;
use crate::terraform::{Terraform, classify_apply_failure};
use hcl::Value;
use indexmap::IndexMap;
use std::fs;
use strato_config::{LifecycleCommand, ModuleConfig, TriggerPhase};
use strato_core::{CancelToken, ExecutionEnvironment};

/// Name of the generated module invocation file
const GENERATED_FILE: &str = "main.tf.json";

/// Outcome of processing one dependency
#[derive(Debug, Clone)]
pub enum Processed {
    /// The module applied successfully and exposed these outputs
    Resolved(IndexMap<String, Value>),
    /// The module cannot be resolved yet; outputs are absent, not an
    /// error
    NotYetAvailable,
}

/// One module ready for provisioning
///
/// Assembled by the resolver once all of the module's own dependencies
/// have resolved and its input expressions have been evaluated.
#[derive(Debug)]
pub struct PreparedModule<'a> {
    /// Dependency name, or the module name for the root
    pub name: &'a str,
    /// Merged configuration of this module
    pub config: &'a ModuleConfig,
    /// Environment to provision in
    pub env: &'a ExecutionEnvironment,
    /// Evaluated input values
    pub inputs: &'a IndexMap<String, Value>,
    /// Lifecycle command driving the overall run
    pub command: LifecycleCommand,
    /// Whether this module asked for an isolated environment
    pub separate_environment: bool,
}

/// Seam between the graph resolver and actual provisioning
pub trait ModuleProcessor {
    /// Provision a dependency and return its outputs, or the soft
    /// "not yet available" signal
    fn process(&self, module: &PreparedModule<'_>) -> Result<Processed>;

    /// Run the requested lifecycle command for the root module
    fn finish(&self, module: &PreparedModule<'_>) -> Result<()>;
}

/// The real processor, backed by the provisioning tool
#[derive(Debug)]
pub struct Processor {
    terraform: Terraform,
    runner: HookRunner,
    cancel: CancelToken,
    init_args: Vec<String>,
    decode_names: bool,
}

impl Processor {
    /// Create a processor around the given tool adapter
    #[must_use]
    pub fn new(terraform: Terraform, cancel: CancelToken) -> Self {
        Self {
            terraform,
            runner: HookRunner::new(),
            cancel,
            init_args: Vec::new(),
            decode_names: false,
        }
    }

    /// Extra arguments forwarded to every `init` invocation
    #[must_use]
    pub fn with_init_args(mut self, args: Vec<String>) -> Self {
        self.init_args = args;
        self
    }

    /// Lowercase and validate output names when parsing
    #[must_use]
    pub fn with_decode_names(mut self, decode_names: bool) -> Self {
        self.decode_names = decode_names;
        self
    }

    fn write_invocation_file(&self, module: &PreparedModule<'_>) -> Result<()> {
        let content = render_invocation(module)?;
        let path = module.env.working_dir().join(GENERATED_FILE);
        fs::write(&path, serde_json::to_vec_pretty(&content)?).map_err(|e| {
            Error::GeneratedFile {
                path: path.clone(),
                source: e,
            }
        })?;

        tracing::debug!(module = module.name, path = %path.display(), "Wrote module invocation file");
        Ok(())
    }
}

impl ModuleProcessor for Processor {
    fn process(&self, module: &PreparedModule<'_>) -> Result<Processed> {
        fs::create_dir_all(module.env.working_dir())?;
        self.write_invocation_file(module)?;

        // Hooks see the materialized working directory.
        if module.separate_environment {
            self.runner.run(
                module.config,
                TriggerPhase::Prepare,
                LifecycleCommand::Init,
                module.env,
                &self.cancel,
            )?;
        }

        self.terraform.init(module.env, &self.cancel, &self.init_args)?;

        let execution = self.terraform.apply(module.env, &self.cancel)?;
        if !execution.success() {
            let class = classify_apply_failure(&execution.stderr);
            if class.is_soft() {
                tracing::info!(
                    module = module.name,
                    class = ?class,
                    "Dependency not yet resolvable, treating outputs as absent"
                );
                return Ok(Processed::NotYetAvailable);
            }
            return Err(Error::Shell(strato_shell::Error::ExitStatus {
                program: self.terraform.binary().to_string(),
                code: execution.code,
                stderr: execution.stderr,
            }));
        }

        let outputs =
            self.terraform
                .output(module.env, &self.cancel, module.name, self.decode_names)?;
        Ok(Processed::Resolved(outputs))
    }

    fn finish(&self, module: &PreparedModule<'_>) -> Result<()> {
        fs::create_dir_all(module.env.working_dir())?;

        let command = module.command;
        self.runner.run(
            module.config,
            TriggerPhase::Prepare,
            command,
            module.env,
            &self.cancel,
        )?;

        self.write_invocation_file(module)?;

        self.runner
            .run(module.config, TriggerPhase::Init, command, module.env, &self.cancel)?;
        self.terraform.init(module.env, &self.cancel, &self.init_args)?;

        match command {
            LifecycleCommand::Init => Ok(()),
            LifecycleCommand::Plan => {
                self.runner.run(
                    module.config,
                    TriggerPhase::Plan,
                    command,
                    module.env,
                    &self.cancel,
                )?;
                self.terraform.plan(module.env, &self.cancel)
            }
            LifecycleCommand::Apply => {
                self.runner.run(
                    module.config,
                    TriggerPhase::Apply,
                    command,
                    module.env,
                    &self.cancel,
                )?;
                let execution = self.terraform.apply(module.env, &self.cancel)?;
                execution.check(self.terraform.binary()).map_err(Error::from)?;
                Ok(())
            }
            LifecycleCommand::Destroy => {
                self.runner.run(
                    module.config,
                    TriggerPhase::Destroy,
                    command,
                    module.env,
                    &self.cancel,
                )?;
                self.terraform.destroy(module.env, &self.cancel)
            }
        }
    }
}

/// Render the generated module invocation file as terraform JSON
///
/// One `module` block referencing the module's source and version, with
/// every evaluated input as a module argument.
pub fn render_invocation(module: &PreparedModule<'_>) -> Result<serde_json::Value> {
    let block = module.config.require_module().map_err(Error::Config)?;

    let mut arguments = serde_json::Map::new();
    arguments.insert("source".to_string(), serde_json::Value::String(block.source.clone()));
    if let Some(version) = &block.version {
        arguments.insert("version".to_string(), serde_json::Value::String(version.clone()));
    }
    for (name, value) in module.inputs {
        arguments.insert(name.clone(), serde_json::to_value(value)?);
    }

    let mut call = serde_json::Map::new();
    call.insert(module.name.to_string(), serde_json::Value::Object(arguments));

    let mut root = serde_json::Map::new();
    root.insert("module".to_string(), serde_json::Value::Object(call));
    Ok(serde_json::Value::Object(root))
}
