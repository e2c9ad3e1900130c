//! CLI subcommand implementations

pub mod apply;
pub mod destroy;
pub mod init;
pub mod plan;
