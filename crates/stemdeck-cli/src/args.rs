use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stemdeck")]
#[command(author, version, about = "Self-hosted stem separation studio")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the web UI
    Serve {
        /// Bind address (overrides config)
        #[arg(short, long)]
        bind: Option<String>,

        /// Port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Download and separate one track without the UI
    Process {
        /// Source URL
        url: String,

        /// Name for the result directory
        #[arg(short, long)]
        name: String,
    },

    /// List processed tracks
    List,

    /// Delete a processed track
    Delete {
        /// Track name as shown by `list`
        name: String,
    },

    /// Check external dependencies
    Doctor,

    /// Show configuration
    Config,
}
