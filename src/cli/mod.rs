//! Command-line interface for workbench.
//!
//! Provides one subcommand per workspace tool plus raw JSON dispatch.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands};
