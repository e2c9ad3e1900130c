//! Hook model and validator
//!
//! A hook binds a command or script to a lifecycle trigger. Hooks are
//! declared in HCL as `hook "<name>" { ... }` blocks; declarations with
//! the same name across files merge (see [`crate::merger`]).

use crate::error::{Error, Result};

/// Lifecycle point at which hooks can fire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerPhase {
    /// Before a module's provisioning lifecycle begins
    Prepare,
    /// Before the provisioning tool's init step
    Init,
    /// Before the provisioning tool's plan step
    Plan,
    /// Before the provisioning tool's apply step
    Apply,
    /// Before the provisioning tool's destroy step
    Destroy,
}

impl TriggerPhase {
    /// String name of this phase
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            TriggerPhase::Prepare => "prepare",
            TriggerPhase::Init => "init",
            TriggerPhase::Plan => "plan",
            TriggerPhase::Apply => "apply",
            TriggerPhase::Destroy => "destroy",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "prepare" => Some(TriggerPhase::Prepare),
            "init" => Some(TriggerPhase::Init),
            "plan" => Some(TriggerPhase::Plan),
            "apply" => Some(TriggerPhase::Apply),
            "destroy" => Some(TriggerPhase::Destroy),
            _ => None,
        }
    }
}

/// Lifecycle subcommands a trigger may qualify on
///
/// These are the top-level operations strato can drive; a trigger like
/// `prepare:init` fires only when the surrounding operation is `init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleCommand {
    /// Initialize modules without applying
    Init,
    /// Plan the root module
    Plan,
    /// Apply the root module
    Apply,
    /// Destroy the root module
    Destroy,
}

impl LifecycleCommand {
    /// String name of this subcommand
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleCommand::Init => "init",
            LifecycleCommand::Plan => "plan",
            LifecycleCommand::Apply => "apply",
            LifecycleCommand::Destroy => "destroy",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "init" => Some(LifecycleCommand::Init),
            "plan" => Some(LifecycleCommand::Plan),
            "apply" => Some(LifecycleCommand::Apply),
            "destroy" => Some(LifecycleCommand::Destroy),
            _ => None,
        }
    }
}

/// Parsed trigger pattern: `<phase>` or `<phase>:<subcommand>`
///
/// A trigger without a subcommand qualifier matches every subcommand of
/// its phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    /// Phase this trigger fires in
    pub phase: TriggerPhase,
    /// Optional subcommand qualifier
    pub subcommand: Option<LifecycleCommand>,
}

impl Default for Trigger {
    fn default() -> Self {
        Self {
            phase: TriggerPhase::Prepare,
            subcommand: None,
        }
    }
}

impl Trigger {
    /// Parse a trigger pattern string
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.split_once(':') {
            None => Some(Self {
                phase: TriggerPhase::from_name(raw)?,
                subcommand: None,
            }),
            Some((phase, subcommand)) => Some(Self {
                phase: TriggerPhase::from_name(phase)?,
                subcommand: Some(LifecycleCommand::from_name(subcommand)?),
            }),
        }
    }

    /// Whether this trigger fires for the given phase and subcommand
    #[must_use]
    pub fn matches(&self, phase: TriggerPhase, subcommand: LifecycleCommand) -> bool {
        self.phase == phase && self.subcommand.is_none_or(|s| s == subcommand)
    }
}

/// A single hook declaration
///
/// Exactly one of `command` and `script` must be set; an empty string
/// counts as unset so override files can declare partial hooks that the
/// merge step completes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hook {
    /// Name of the hook (merge key, block label)
    pub name: String,

    /// Direct command to execute
    pub command: Option<String>,

    /// Path to script file to execute, relative to the declaring module
    pub script: Option<String>,

    /// Trigger pattern, `<phase>` or `<phase>:<subcommand>`
    ///
    /// Defaults to `prepare` when unset.
    pub trigger_on: Option<String>,

    /// Ordered arguments passed to the command or script
    pub args: Vec<String>,
}

impl Hook {
    /// Parse this hook's trigger, applying the `prepare` default
    pub fn trigger(&self) -> Result<Trigger> {
        match self.trigger_on.as_deref() {
            None | Some("") => Ok(Trigger::default()),
            Some(raw) => Trigger::parse(raw).ok_or_else(|| Error::InvalidTrigger {
                hook: self.name.clone(),
                trigger: raw.to_string(),
            }),
        }
    }

    /// Validate the mutual-exclusion and trigger constraints
    ///
    /// Fails with [`Error::MissingCommand`] if neither `command` nor
    /// `script` is set, [`Error::ConflictingCommand`] if both are, and
    /// [`Error::InvalidTrigger`] if the trigger phase or subcommand is
    /// not recognized.
    pub fn validate(&self) -> Result<()> {
        let command = self.command.as_deref().filter(|c| !c.is_empty());
        let script = self.script.as_deref().filter(|s| !s.is_empty());

        match (command, script) {
            (None, None) => {
                return Err(Error::MissingCommand {
                    hook: self.name.clone(),
                });
            }
            (Some(_), Some(_)) => {
                return Err(Error::ConflictingCommand {
                    hook: self.name.clone(),
                });
            }
            _ => {}
        }

        self.trigger().map(|_| ())
    }
}
