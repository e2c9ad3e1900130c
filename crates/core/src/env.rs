//! Per-module execution environment
//!
//! Every provisioning tool invocation and hook invocation runs inside an
//! [`ExecutionEnvironment`]: a working directory plus an ordered map of
//! environment variables. Environments are inherited by reference from the
//! parent module and only copied when a dependency requests an isolated
//! environment (copy-on-branch).

use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Working directory and environment variables for one module
#[derive(Debug, Clone, Default)]
pub struct ExecutionEnvironment {
    working_dir: PathBuf,
    vars: IndexMap<String, String>,
    isolated: bool,
}

impl ExecutionEnvironment {
    /// Create an environment rooted at the given working directory
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            vars: IndexMap::new(),
            isolated: false,
        }
    }

    /// The working directory commands run in
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Ordered environment variables for child processes
    ///
    /// In the default mode these are applied on top of the inherited
    /// process environment; in isolated mode they are the whole child
    /// environment.
    #[must_use]
    pub fn vars(&self) -> &IndexMap<String, String> {
        &self.vars
    }

    /// Whether children receive only this environment's variables
    #[must_use]
    pub fn is_isolated(&self) -> bool {
        self.isolated
    }

    /// Builder-style switch to isolated mode
    ///
    /// Children of an isolated environment do not inherit the parent
    /// process environment at all; [`ExecutionEnvironment::vars`] is the
    /// complete child environment.
    #[must_use]
    pub fn isolated(mut self) -> Self {
        self.isolated = true;
        self
    }

    /// Set a single environment variable
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Merge a whole variable map, later entries overriding earlier ones
    pub fn extend(&mut self, vars: &IndexMap<String, String>) {
        for (k, v) in vars {
            self.vars.insert(k.clone(), v.clone());
        }
    }

    /// Builder-style variant of [`ExecutionEnvironment::set`]
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Branch a copy of this environment into a new working directory
    ///
    /// This is the copy-on-branch point for isolated-environment mode: the
    /// variable map is cloned so mutations in the branch never leak back
    /// into the parent.
    #[must_use]
    pub fn branch(&self, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            vars: self.vars.clone(),
            isolated: self.isolated,
        }
    }
}
