//! Subcommand implementations.

pub mod list;
pub mod template;
pub mod train;
