//! Provisioning tool adapter
//!
//! Builds and runs the provisioning tool's lifecycle commands through
//! the streaming executor, parses its structured output, and translates
//! its diagnostic text into a [`FailureClass`]. This is the only place
//! that knows the tool's command-line surface or its message formats.

use crate::error::{Error, Result};
use hcl::Value;
use indexmap::IndexMap;
use strato_core::{CancelToken, ExecutionEnvironment};
use strato_shell::{ExecOptions, Execution};

/// Why an apply step failed
///
/// Only the adapter inspects raw diagnostic text; everything above this
/// seam reasons in terms of this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Unrecoverable failure
    Fatal,
    /// The module reads remote state that does not exist yet
    MissingDependencyState,
    /// The module exposes an output the current schema cannot express
    UnsupportedOutput,
}

impl FailureClass {
    /// Whether this failure means "not yet resolvable" rather than an
    /// error
    #[must_use]
    pub fn is_soft(&self) -> bool {
        !matches!(self, FailureClass::Fatal)
    }
}

/// Diagnostic substrings that identify a dependency without state
const MISSING_STATE_DIAGNOSTICS: &[&str] = &["Unable to find remote state", "remote state not found"];

/// Diagnostic substrings that identify an unsupported output attribute
const UNSUPPORTED_OUTPUT_DIAGNOSTICS: &[&str] = &["Unsupported attribute"];

/// Classify a failed apply from its captured error stream
#[must_use]
pub fn classify_apply_failure(stderr: &str) -> FailureClass {
    if MISSING_STATE_DIAGNOSTICS.iter().any(|d| stderr.contains(d)) {
        FailureClass::MissingDependencyState
    } else if UNSUPPORTED_OUTPUT_DIAGNOSTICS.iter().any(|d| stderr.contains(d)) {
        FailureClass::UnsupportedOutput
    } else {
        FailureClass::Fatal
    }
}

/// Invokes the provisioning tool's lifecycle subcommands
#[derive(Debug, Clone)]
pub struct Terraform {
    binary: String,
}

impl Default for Terraform {
    fn default() -> Self {
        Self::new("terraform")
    }
}

impl Terraform {
    /// Create an adapter for the given binary name or path
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Binary name or path this adapter invokes
    #[must_use]
    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn run(
        &self,
        env: &ExecutionEnvironment,
        cancel: &CancelToken,
        args: &[String],
    ) -> Result<Execution> {
        let options = ExecOptions { env, cancel };
        let execution = strato_shell::execute(&options, &self.binary, args)?;
        Ok(execution)
    }

    /// Run `init -input=false`, forwarding any extra backend arguments
    ///
    /// Any failure here is fatal; a broken module reference is not
    /// recoverable.
    pub fn init(
        &self,
        env: &ExecutionEnvironment,
        cancel: &CancelToken,
        extra_args: &[String],
    ) -> Result<()> {
        let mut args = vec!["init".to_string(), "-input=false".to_string()];
        args.extend(extra_args.iter().cloned());
        self.run(env, cancel, &args)?.check(&self.binary)?;
        Ok(())
    }

    /// Run `plan -input=false`
    pub fn plan(&self, env: &ExecutionEnvironment, cancel: &CancelToken) -> Result<()> {
        let args = vec!["plan".to_string(), "-input=false".to_string()];
        self.run(env, cancel, &args)?.check(&self.binary)?;
        Ok(())
    }

    /// Run `apply -auto-approve -input=false`
    ///
    /// Returns the raw execution so the caller can classify a nonzero
    /// exit from the captured error stream.
    pub fn apply(&self, env: &ExecutionEnvironment, cancel: &CancelToken) -> Result<Execution> {
        let args = vec![
            "apply".to_string(),
            "-auto-approve".to_string(),
            "-input=false".to_string(),
        ];
        self.run(env, cancel, &args)
    }

    /// Run `destroy -auto-approve`
    pub fn destroy(&self, env: &ExecutionEnvironment, cancel: &CancelToken) -> Result<()> {
        let args = vec!["destroy".to_string(), "-auto-approve".to_string()];
        self.run(env, cancel, &args)?.check(&self.binary)?;
        Ok(())
    }

    /// Run `output -json` and parse the result
    pub fn output(
        &self,
        env: &ExecutionEnvironment,
        cancel: &CancelToken,
        module: &str,
        decode_names: bool,
    ) -> Result<IndexMap<String, Value>> {
        let args = vec!["output".to_string(), "-json".to_string()];
        let execution = self.run(env, cancel, &args)?.check(&self.binary)?;
        parse_outputs(&execution.stdout, module, decode_names)
    }
}

/// Parse an `output -json` stream into an output value map
///
/// The stream maps each output name to `{sensitive, type, value}`; only
/// the value is retained, and an entry without a `value` key is a fatal
/// parse error. With `decode_names`, names are lowercased and must
/// contain only alphanumerics, underscores and hyphens.
pub fn parse_outputs(
    stdout: &str,
    module: &str,
    decode_names: bool,
) -> Result<IndexMap<String, Value>> {
    let raw: IndexMap<String, serde_json::Value> =
        serde_json::from_str(stdout).map_err(|e| Error::OutputParse {
            module: module.to_string(),
            source: e,
        })?;

    let mut outputs = IndexMap::with_capacity(raw.len());
    for (name, entry) in raw {
        let name = if decode_names {
            decode_name(&name, module)?
        } else {
            name
        };

        let Some(value) = entry.get("value").cloned() else {
            return Err(Error::MalformedOutput {
                module: module.to_string(),
                name,
            });
        };
        let value: Value = serde_json::from_value(value).map_err(|e| Error::OutputParse {
            module: module.to_string(),
            source: e,
        })?;
        outputs.insert(name, value);
    }

    Ok(outputs)
}

fn decode_name(name: &str, module: &str) -> Result<String> {
    let decoded = name.to_lowercase();
    if decoded.is_empty()
        || !decoded.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(Error::InvalidOutputName {
            module: module.to_string(),
            name: name.to_string(),
        });
    }
    Ok(decoded)
}
