//! Core types and utilities for strato
//!
//! This is the foundation crate (Layer 0) that all other strato crates depend on.
//! It provides:
//! - Base error types
//! - The per-module execution environment (working directory + env vars)
//! - Cancellation tokens threaded through every subprocess invocation
//!
//! This crate has no dependencies on other strato crates.

pub mod cancel;
pub mod env;
pub mod error;

pub use cancel::CancelToken;
pub use env::ExecutionEnvironment;
pub use error::{Error, Result};
