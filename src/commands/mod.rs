//! CLI command implementations for watch-process.
//!
//! This module provides implementations for all CLI subcommands:
//! - `check`: configuration and listing command validation
//! - `config`: configuration file generation
//! - `test`: run a few ticks and print the records

pub mod check;
pub mod config;
pub mod test;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use test::command_test;
