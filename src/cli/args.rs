//! CLI argument definitions using clap
//!
//! Commands:
//! - filegate init --config <path> [--data-dir <dir>]
//! - filegate serve --config <path> [--port <port>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// filegate - File sharing with validated uploads and policy-gated downloads
#[derive(Parser, Debug)]
#[command(name = "filegate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a fresh configuration file and create the data directory
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./filegate.json")]
        config: PathBuf,

        /// Data directory recorded in the new configuration
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Start the HTTP server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./filegate.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
