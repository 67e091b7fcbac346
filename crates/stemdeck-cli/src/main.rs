mod args;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let filter = match cli.verbose {
        0 => "stemdeck=info,stemdeck_core=info,stemdeck_web=info",
        1 => "stemdeck=debug,stemdeck_core=debug,stemdeck_web=debug",
        2 => "stemdeck=trace,stemdeck_core=trace,stemdeck_web=trace",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Serve { bind, port } => {
            commands::serve::run(bind, port, cli.config.as_deref()).await
        }
        Commands::Process { url, name } => {
            commands::process::run(&url, &name, cli.config.as_deref()).await
        }
        Commands::List => commands::list::run(cli.config.as_deref()).await,
        Commands::Delete { name } => commands::delete::run(&name, cli.config.as_deref()).await,
        Commands::Doctor => commands::doctor::run().await,
        Commands::Config => commands::config::run(cli.config.as_deref()).await,
    }
}
