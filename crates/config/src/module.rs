//! Module declarations and the merged module configuration

use crate::dependency::Dependency;
use crate::error::{Error, Result};
use crate::hook::Hook;
use hcl::Expression;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// The `module { ... }` block: which infrastructure module to provision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleBlock {
    /// Module address: registry address or local path
    pub source: String,

    /// Optional version constraint (registry sources only)
    pub version: Option<String>,
}

/// One logical module configuration after merging all declaration files
///
/// Produced by [`crate::merger::merge`]; immutable afterward.
#[derive(Debug, Clone, Default)]
pub struct ModuleConfig {
    /// Primary declaration file (module identity)
    pub path: PathBuf,

    /// Module block, if any file declared one
    pub module: Option<ModuleBlock>,

    /// Ordered dependency declarations
    pub dependencies: Vec<Dependency>,

    /// Merged hooks in first-encounter order
    pub hooks: Vec<Hook>,

    /// Input variable expressions, evaluated at provisioning time
    pub inputs: IndexMap<String, Expression>,

    /// Environment variables for the provisioning tool's process
    pub environment: IndexMap<String, String>,
}

impl ModuleConfig {
    /// Short name of this module, derived from the file stem
    #[must_use]
    pub fn name(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("module")
    }

    /// Directory containing the module's declaration file
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// The module block, or an error if no file declared one
    pub fn require_module(&self) -> Result<&ModuleBlock> {
        self.module.as_ref().ok_or_else(|| Error::MissingModule {
            path: self.path.clone(),
        })
    }
}
