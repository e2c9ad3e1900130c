//! Dependency declarations
//!
//! A dependency is a reference from one module to another whose outputs
//! become the referencing module's inputs. Declared in HCL as
//! `dependency "<name>" { ... }` blocks.

use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// A single dependency declaration
#[derive(Debug, Clone, Default)]
pub struct Dependency {
    /// Name of the dependency (block label, unique within a module)
    pub name: String,

    /// Path to the dependency's declaration file, relative to the
    /// declaring file
    pub source: String,

    /// Run hooks and provisioning in a branched environment instead of
    /// inheriting the parent's
    pub separate_environment: bool,

    /// Per-dependency environment variable overrides
    pub environment: IndexMap<String, String>,

    /// File this dependency was declared in (for error reporting and
    /// source resolution)
    pub declared_in: PathBuf,
}

impl Dependency {
    /// Resolve the dependency's source path against the declaring file
    #[must_use]
    pub fn source_path(&self) -> PathBuf {
        let source = Path::new(&self.source);
        if source.is_absolute() {
            source.to_path_buf()
        } else {
            self.declared_in
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(source)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_path_relative_to_declaring_file() {
        let dep = Dependency {
            name: "network".to_string(),
            source: "./network.hcl".to_string(),
            declared_in: PathBuf::from("/work/env/app.hcl"),
            ..Dependency::default()
        };
        assert_eq!(dep.source_path(), PathBuf::from("/work/env/./network.hcl"));
    }

    #[test]
    fn test_source_path_absolute() {
        let dep = Dependency {
            name: "network".to_string(),
            source: "/elsewhere/network.hcl".to_string(),
            declared_in: PathBuf::from("/work/env/app.hcl"),
            ..Dependency::default()
        };
        assert_eq!(dep.source_path(), PathBuf::from("/elsewhere/network.hcl"));
    }
}
