//! Config merger
//!
//! Combines the declaration files for one module into a single
//! [`ModuleConfig`]. Files are processed in load order; the merge is a
//! pure function over the parsed files.
//!
//! Merge rules:
//! - hooks group by name; scalar fields (command, script, trigger_on)
//!   take the last non-empty value, argument lists concatenate in
//!   encounter order
//! - dependency names must be unique across all files; a duplicate is a
//!   fatal error naming both files
//! - `inputs` and `environment_variables` attributes override key-by-key,
//!   later files winning
//! - the last `module` block wins

use crate::error::{Error, Result};
use crate::file::SourceFile;
use crate::hook::Hook;
use crate::module::ModuleConfig;
use indexmap::IndexMap;
use std::path::PathBuf;

/// Merge parsed declaration files, in load order, into one configuration
///
/// The loader puts override files first and the module's own file last,
/// so the last file both wins scalar overrides and provides the module's
/// identity. All merged hooks are validated; an invalid hook is a fatal
/// configuration error surfaced here, before anything executes.
pub fn merge(files: &[SourceFile]) -> Result<ModuleConfig> {
    let mut config = ModuleConfig {
        path: files.last().map(|f| f.path.clone()).unwrap_or_default(),
        ..ModuleConfig::default()
    };

    let mut seen_deps: IndexMap<String, PathBuf> = IndexMap::new();

    for file in files {
        if let Some(module) = &file.module {
            config.module = Some(module.clone());
        }

        for dep in &file.dependencies {
            if let Some(first) = seen_deps.get(&dep.name) {
                return Err(Error::DuplicateDependency {
                    name: dep.name.clone(),
                    first: first.clone(),
                    second: file.path.clone(),
                });
            }
            seen_deps.insert(dep.name.clone(), file.path.clone());
            config.dependencies.push(dep.clone());
        }

        for hook in &file.hooks {
            merge_hook(&mut config.hooks, hook);
        }

        for (key, expr) in &file.inputs {
            config.inputs.insert(key.clone(), expr.clone());
        }

        for (key, value) in &file.environment {
            config.environment.insert(key.clone(), value.clone());
        }
    }

    for hook in &config.hooks {
        hook.validate()?;
    }

    Ok(config)
}

fn merge_hook(hooks: &mut Vec<Hook>, incoming: &Hook) {
    let Some(existing) = hooks.iter_mut().find(|h| h.name == incoming.name) else {
        hooks.push(incoming.clone());
        return;
    };

    if let Some(command) = non_empty(&incoming.command) {
        existing.command = Some(command);
    }
    if let Some(script) = non_empty(&incoming.script) {
        existing.script = Some(script);
    }
    if let Some(trigger) = non_empty(&incoming.trigger_on) {
        existing.trigger_on = Some(trigger);
    }
    existing.args.extend(incoming.args.iter().cloned());
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|v| !v.is_empty()).map(String::from)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    const HOOK_BASE: &str = r#"
        hook "name" {
          command    = "command"
          trigger_on = "prepare"
        }
    "#;

    const HOOK_OVERWRITE: &str = r#"
        hook "name" {
          command = "overwrite"
          args    = ["arg1", "arg2"]
        }
    "#;

    const HOOK_MORE_ARGS: &str = r#"
        hook "name" {
          args = ["arg3"]
        }
    "#;

    fn parse(path: &str, content: &str) -> SourceFile {
        SourceFile::parse(path, content).unwrap()
    }

    #[test]
    fn test_merge_single_file() {
        let config = merge(&[parse("/hook1.hcl", HOOK_BASE)]).unwrap();

        assert_eq!(config.hooks.len(), 1);
        assert_eq!(config.hooks[0].command.as_deref(), Some("command"));
        assert_eq!(config.hooks[0].trigger_on.as_deref(), Some("prepare"));
        assert!(config.hooks[0].args.is_empty());
    }

    #[test]
    fn test_merge_scalar_takes_last_nonempty() {
        let config = merge(&[
            parse("/hook1.hcl", HOOK_BASE),
            parse("/hook2.hcl", HOOK_OVERWRITE),
        ])
        .unwrap();

        assert_eq!(config.hooks.len(), 1);
        let hook = &config.hooks[0];
        assert_eq!(hook.command.as_deref(), Some("overwrite"));
        // trigger_on untouched by the second file
        assert_eq!(hook.trigger_on.as_deref(), Some("prepare"));
        assert_eq!(hook.args, vec!["arg1", "arg2"]);
    }

    #[test]
    fn test_merge_args_concatenate_across_files() {
        let config = merge(&[
            parse("/hook1.hcl", HOOK_BASE),
            parse("/hook2.hcl", HOOK_OVERWRITE),
            parse("/hook3.hcl", HOOK_MORE_ARGS),
        ])
        .unwrap();

        let hook = &config.hooks[0];
        assert_eq!(hook.command.as_deref(), Some("overwrite"));
        assert_eq!(hook.args, vec!["arg1", "arg2", "arg3"]);
    }

    #[test]
    fn test_merge_three_files_scenario() {
        // command = "a" then command = "b"; args accumulate in file order.
        let config = merge(&[
            parse("/a.hcl", "hook \"h\" {\n  command = \"a\"\n}"),
            parse("/b.hcl", "hook \"h\" {\n  command = \"b\"\n  args = [\"1\"]\n}"),
            parse("/c.hcl", "hook \"h\" {\n  args = [\"2\"]\n}"),
        ])
        .unwrap();

        let hook = &config.hooks[0];
        assert_eq!(hook.command.as_deref(), Some("b"));
        assert_eq!(hook.args, vec!["1", "2"]);
    }

    #[test]
    fn test_merge_distinct_hooks_keep_order() {
        let config = merge(&[
            parse("/a.hcl", "hook \"first\" {\n  command = \"a\"\n}"),
            parse("/b.hcl", "hook \"second\" {\n  command = \"b\"\n}"),
        ])
        .unwrap();

        let names: Vec<_> = config.hooks.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn test_merge_invalid_hook_is_fatal() {
        // Hook ends up with neither command nor script.
        let err = merge(&[parse("/a.hcl", "hook \"h\" {\n  trigger_on = \"prepare\"\n}")])
            .unwrap_err();
        assert!(matches!(err, Error::MissingCommand { .. }));
    }

    #[test]
    fn test_merge_duplicate_dependency_names_both_files() {
        let a = parse(
            "/a.hcl",
            "dependency \"net\" {\n  source = \"./net.hcl\"\n}",
        );
        let b = parse(
            "/b.hcl",
            "dependency \"net\" {\n  source = \"./other.hcl\"\n}",
        );

        let err = merge(&[a, b]).unwrap_err();
        match err {
            Error::DuplicateDependency { name, first, second } => {
                assert_eq!(name, "net");
                assert_eq!(first, PathBuf::from("/a.hcl"));
                assert_eq!(second, PathBuf::from("/b.hcl"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_merge_inputs_and_environment_override() {
        let config = merge(&[
            parse(
                "/a.hcl",
                "inputs {\n  name = \"a\"\n  keep = true\n}\nenvironment_variables {\n  REGION = \"west\"\n}",
            ),
            parse(
                "/b.hcl",
                "inputs {\n  name = \"b\"\n}\nenvironment_variables {\n  REGION = \"east\"\n}",
            ),
        ])
        .unwrap();

        assert_eq!(config.inputs.len(), 2);
        assert_eq!(config.environment.get("REGION").unwrap(), "east");
    }

    #[test]
    fn test_merge_last_module_block_wins() {
        let config = merge(&[
            parse("/auto.hcl", "module {\n  source = \"./base\"\n}"),
            parse("/main.hcl", "module {\n  source = \"./real\"\n}"),
        ])
        .unwrap();

        assert_eq!(config.module.unwrap().source, "./real");
    }

    #[test]
    fn test_merge_primary_file_is_identity() {
        let config = merge(&[
            parse("/main_auto.hcl", "module {\n  source = \"./m\"\n}"),
            parse("/main.hcl", ""),
        ])
        .unwrap();
        assert_eq!(config.path, PathBuf::from("/main.hcl"));
        assert_eq!(config.name(), "main");
    }
}
