//! CLI command definitions for the `rtalk` binary.

pub mod ask;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Chat with a GitHub repository.
#[derive(Parser)]
#[command(name = "rtalk", version, about, long_about = None)]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to a repotalk.toml config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the WebSocket chat server.
    Serve {
        /// Bind address; overrides the config file.
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on; overrides the config file.
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ingest a repository, ask one question, print the answer, exit.
    Ask {
        /// Repository owner (e.g. "EnhancedJax").
        owner: String,

        /// Repository name (e.g. "Bagels").
        repo: String,

        /// The question to ask about the repository.
        question: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
