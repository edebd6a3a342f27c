//! CLI module for filegate
//!
//! Provides command-line interface for:
//! - init: Write a configuration file and create the data directory
//! - serve: Start the HTTP server

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{init, run, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
