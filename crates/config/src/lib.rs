//! Configuration management for strato
//!
//! This crate handles:
//! - Parsing HCL declaration files into typed structures
//! - The hook model and its validator
//! - Dependency declarations
//! - Merging multiple declaration files into one module configuration
//! - Discovering a module's declaration files on disk
//! - Logging initialization

pub mod dependency;
pub mod error;
pub mod file;
pub mod hook;
pub mod loader;
pub mod logging;
pub mod merger;
pub mod module;

pub use dependency::Dependency;
pub use error::{Error, Result};
pub use file::SourceFile;
pub use hook::{Hook, LifecycleCommand, Trigger, TriggerPhase};
pub use loader::Loader;
pub use merger::merge;
pub use module::{ModuleBlock, ModuleConfig};
