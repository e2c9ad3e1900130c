//! Hook runner
//!
//! Fires the hooks of a module configuration that match a lifecycle
//! trigger, in merged declaration order, fail-fast. Command hooks split
//! their command string into words; script hooks resolve the script
//! path against the declaring module's directory. Both run through the
//! streaming executor inside the module's execution environment.

use crate::error::{Error, Result};
use strato_config::{Hook, LifecycleCommand, ModuleConfig, TriggerPhase};
use strato_core::{CancelToken, ExecutionEnvironment};
use strato_shell::ExecOptions;

/// Runs lifecycle hooks for a module
#[derive(Debug, Clone, Copy, Default)]
pub struct HookRunner {
    _private: (),
}

impl HookRunner {
    /// Create a new hook runner
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire every hook matching the given phase and subcommand
    ///
    /// Hooks run synchronously in declaration order; the first nonzero
    /// exit or spawn failure aborts the phase and later hooks do not
    /// run.
    pub fn run(
        &self,
        config: &ModuleConfig,
        phase: TriggerPhase,
        subcommand: LifecycleCommand,
        env: &ExecutionEnvironment,
        cancel: &CancelToken,
    ) -> Result<()> {
        for hook in &config.hooks {
            let trigger = hook.trigger()?;
            if !trigger.matches(phase, subcommand) {
                continue;
            }

            tracing::info!(
                hook = %hook.name,
                phase = phase.name(),
                subcommand = subcommand.name(),
                "Running hook"
            );
            self.run_hook(config, hook, env, cancel)?;
        }

        Ok(())
    }

    fn run_hook(
        &self,
        config: &ModuleConfig,
        hook: &Hook,
        env: &ExecutionEnvironment,
        cancel: &CancelToken,
    ) -> Result<()> {
        let (program, mut args) = if let Some(command) = hook.command.as_deref() {
            let mut words = shell_words::split(command).map_err(|e| Error::HookCommand {
                hook: hook.name.clone(),
                source: e,
            })?;
            if words.is_empty() {
                return Err(Error::Hook {
                    hook: hook.name.clone(),
                    source: strato_shell::Error::Spawn {
                        program: command.to_string(),
                        source: std::io::Error::new(
                            std::io::ErrorKind::InvalidInput,
                            "empty command",
                        ),
                    },
                });
            }
            let program = words.remove(0);
            (program, words)
        } else if let Some(script) = hook.script.as_deref() {
            let path = config.dir().join(script);
            (path.to_string_lossy().into_owned(), Vec::new())
        } else {
            // validate() rejects this shape before any hook runs
            return Ok(());
        };
        args.extend(hook.args.iter().cloned());

        let options = ExecOptions { env, cancel };
        strato_shell::execute(&options, &program, &args)
            .and_then(|execution| execution.check(&program))
            .map_err(|e| Error::Hook {
                hook: hook.name.clone(),
                source: e,
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::path::Path;

    fn config(dir: &Path, hooks: Vec<Hook>) -> ModuleConfig {
        ModuleConfig {
            path: dir.join("app.hcl"),
            hooks,
            ..ModuleConfig::default()
        }
    }

    fn command_hook(name: &str, command: &str, trigger_on: &str, args: &[&str]) -> Hook {
        Hook {
            name: name.to_string(),
            command: Some(command.to_string()),
            trigger_on: Some(trigger_on.to_string()),
            args: args.iter().map(ToString::to_string).collect(),
            ..Hook::default()
        }
    }

    #[test]
    fn test_run_matching_command_hook() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(
            tmp.path(),
            vec![command_hook("touch", "touch", "prepare", &["created.txt"])],
        );
        let env = ExecutionEnvironment::new(tmp.path());
        let cancel = CancelToken::new();

        HookRunner::new()
            .run(&config, TriggerPhase::Prepare, LifecycleCommand::Apply, &env, &cancel)
            .unwrap();
        assert!(tmp.path().join("created.txt").exists());
    }

    #[test]
    fn test_non_matching_hooks_do_not_run() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(
            tmp.path(),
            vec![
                command_hook("would-fail", "false", "apply", &[]),
                command_hook("wrong-subcommand", "false", "prepare:destroy", &[]),
            ],
        );
        let env = ExecutionEnvironment::new(tmp.path());
        let cancel = CancelToken::new();

        HookRunner::new()
            .run(&config, TriggerPhase::Prepare, LifecycleCommand::Apply, &env, &cancel)
            .unwrap();
    }

    #[test]
    fn test_fail_fast_skips_later_hooks() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(
            tmp.path(),
            vec![
                command_hook("fails", "false", "prepare", &[]),
                command_hook("never-runs", "touch", "prepare", &["late.txt"]),
            ],
        );
        let env = ExecutionEnvironment::new(tmp.path());
        let cancel = CancelToken::new();

        let err = HookRunner::new()
            .run(&config, TriggerPhase::Prepare, LifecycleCommand::Apply, &env, &cancel)
            .unwrap_err();
        assert!(matches!(err, Error::Hook { ref hook, .. } if hook == "fails"));
        assert!(!tmp.path().join("late.txt").exists());
    }

    #[test]
    fn test_command_string_splits_into_words() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(
            tmp.path(),
            vec![command_hook("shell", "sh -c", "prepare", &["echo done > out.txt"])],
        );
        let env = ExecutionEnvironment::new(tmp.path());
        let cancel = CancelToken::new();

        HookRunner::new()
            .run(&config, TriggerPhase::Prepare, LifecycleCommand::Init, &env, &cancel)
            .unwrap();
        assert!(tmp.path().join("out.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_script_hook_resolves_against_module_dir() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let script = tmp.path().join("setup.sh");
        std::fs::write(&script, "#!/bin/sh\ntouch \"$1\"\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let config = config(
            tmp.path(),
            vec![Hook {
                name: "setup".to_string(),
                script: Some("setup.sh".to_string()),
                trigger_on: Some("prepare:init".to_string()),
                args: vec!["from-script.txt".to_string()],
                ..Hook::default()
            }],
        );
        let env = ExecutionEnvironment::new(tmp.path());
        let cancel = CancelToken::new();

        HookRunner::new()
            .run(&config, TriggerPhase::Prepare, LifecycleCommand::Init, &env, &cancel)
            .unwrap();
        assert!(tmp.path().join("from-script.txt").exists());
    }
}
