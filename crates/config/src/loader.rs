//! Module loader
//!
//! Discovers the declaration files that make up one module and merges
//! them. A module is declared by a single `.hcl` file; sibling files
//! named `*_auto.hcl` in the same directory are override files merged
//! into every module of that directory. Override files load first, in
//! lexicographic order, and the module's own file loads last so its
//! declarations win.

use crate::error::{Error, Result};
use crate::file::SourceFile;
use crate::merger;
use crate::module::ModuleConfig;
use std::fs;
use std::path::{Path, PathBuf};

const AUTO_SUFFIX: &str = "_auto.hcl";

/// Loads and merges module declaration files
///
/// Each call parses independently; there is no shared parser state, so
/// loaders can be created freely (including one per test).
#[derive(Debug, Clone, Default)]
pub struct Loader {
    _private: (),
}

impl Loader {
    /// Create a new loader
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the module declared by `path`, including its override files
    pub fn load(&self, path: &Path) -> Result<ModuleConfig> {
        let path = fs::canonicalize(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut files = Vec::new();
        for auto in auto_files(&path)? {
            tracing::debug!(
                file = %auto.display(),
                module = %path.display(),
                "Merging override file"
            );
            files.push(SourceFile::read(&auto)?);
        }
        files.push(SourceFile::read(&path)?);

        merger::merge(&files)
    }
}

/// Override files for a module, sorted, excluding the module file itself
fn auto_files(module: &Path) -> Result<Vec<PathBuf>> {
    let Some(dir) = module.parent() else {
        return Ok(Vec::new());
    };

    let mut autos: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|p| {
            p.is_file()
                && p != module
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(AUTO_SUFFIX))
        })
        .collect();

    autos.sort();
    Ok(autos)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_merges_auto_files_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "a_auto.hcl",
            "hook \"h\" {\n  command = \"a\"\n}",
        );
        write(
            tmp.path(),
            "b_auto.hcl",
            "hook \"h\" {\n  command = \"b\"\n  args = [\"1\"]\n}",
        );
        let main = write(
            tmp.path(),
            "app.hcl",
            "module {\n  source = \"./m\"\n}\nhook \"h\" {\n  args = [\"2\"]\n}",
        );

        let config = Loader::new().load(&main).unwrap();

        assert_eq!(config.hooks.len(), 1);
        assert_eq!(config.hooks[0].command.as_deref(), Some("b"));
        assert_eq!(config.hooks[0].args, vec!["1", "2"]);
        assert_eq!(config.name(), "app");
    }

    #[test]
    fn test_load_module_file_overrides_autos() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "env_auto.hcl",
            "environment_variables {\n  REGION = \"west\"\n}",
        );
        let main = write(
            tmp.path(),
            "app.hcl",
            "module {\n  source = \"./m\"\n}\nenvironment_variables {\n  REGION = \"east\"\n}",
        );

        let config = Loader::new().load(&main).unwrap();
        assert_eq!(config.environment.get("REGION").unwrap(), "east");
    }

    #[test]
    fn test_load_auto_file_is_not_loaded_twice_as_module() {
        let tmp = tempfile::tempdir().unwrap();
        let auto = write(
            tmp.path(),
            "base_auto.hcl",
            "module {\n  source = \"./m\"\n}",
        );

        // Loading the auto file itself must not duplicate its declarations.
        let config = Loader::new().load(&auto).unwrap();
        assert_eq!(config.module.unwrap().source, "./m");
    }

    #[test]
    fn test_load_missing_file() {
        let err = Loader::new().load(Path::new("/nonexistent/app.hcl")).unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }
}
