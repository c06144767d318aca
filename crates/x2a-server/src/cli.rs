use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI parser for the `x2a` binary.
#[derive(Debug, Parser)]
#[command(
    name = "x2a",
    version,
    about = "x2a - Chef to Ansible migration runs on Kubernetes"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Extra TOML configuration file, layered above x2a.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP service
    Serve {
        /// Override `server.bind_address`
        #[arg(long)]
        bind: Option<String>,
    },
    /// Load and validate the configuration, then print it with secrets redacted
    CheckConfig,
    /// Print the JSON Schema of an API type, or list the known names
    Schema {
        /// Type name, e.g. `project_view`
        name: Option<String>,
    },
}
