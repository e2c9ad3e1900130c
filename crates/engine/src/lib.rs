//! Dependency resolution and provisioning engine for strato
//!
//! This crate holds everything between the parsed module configuration
//! and the provisioning tool:
//! - The hook runner that fires lifecycle hooks
//! - The provisioning tool adapter and its failure classification
//! - The dependency processor for one module
//! - The graph resolver that orders and drives the whole run

pub mod error;
pub mod hooks;
pub mod processor;
pub mod resolver;
pub mod terraform;

pub use error::{Error, Result};
pub use hooks::HookRunner;
pub use processor::{ModuleProcessor, PreparedModule, Processed, Processor};
pub use resolver::Resolver;
pub use terraform::{FailureClass, Terraform, classify_apply_failure, parse_outputs};
