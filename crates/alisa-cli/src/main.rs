//! ALISA CLI - Command-line interface for the ALISA log audit pipeline.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "alisa=debug" } else { "alisa=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Process(args) => commands::process::run(&cli.config, &args).await,
        Commands::Demo(args) => commands::demo::run(&cli.config, &args).await,
        Commands::Seed(args) => commands::seed::run(&cli.config, &args),
        Commands::Hash(args) => {
            commands::hash::run(&args);
            Ok(())
        }
        Commands::Verify => commands::verify::run(&cli.config),
        Commands::Policy(args) => commands::policy::run(&cli.config, &args),
        Commands::Findings(args) => commands::findings::run(&cli.config, &args),
        Commands::Version => {
            println!("alisa {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
