//! Streaming subprocess execution for strato
//!
//! This crate provides the single primitive every provisioning tool and
//! hook invocation goes through: spawn a process, stream its output
//! line-by-line as it arrives, capture everything, honor cancellation,
//! and report the exit status.

pub mod error;
pub mod executor;

pub use error::{Error, Result};
pub use executor::{ExecOptions, Execution, execute};
