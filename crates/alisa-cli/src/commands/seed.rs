//! Seed command implementation.

use alisa_pipeline::bootstrap;
use alisa_test::{seed_audit_trail, LogGenerator};
use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use super::ConfigArgs;

/// Arguments for the seed command.
#[derive(Args)]
pub struct SeedArgs {
    /// Number of normal log lines to write
    #[arg(short, long, default_value = "50")]
    pub count: usize,

    /// Seed for the log generator (random if omitted)
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Runs the seed command.
pub fn run(config: &ConfigArgs, args: &SeedArgs) -> Result<()> {
    let config = config.resolve()?;
    let store = bootstrap::open_store(&config.storage).context("Failed to open audit trail")?;
    let mut generator = args.seed.map_or_else(LogGenerator::new, LogGenerator::seeded);

    info!(database = %config.storage.database.display(), count = args.count, "Seeding audit trail");
    let summary = seed_audit_trail(store.as_ref(), &mut generator, args.count)?;

    println!("ALISA Data Seeder");
    println!("=================");
    println!("Database:   {}", config.storage.database.display());
    println!("Baselines:  {}", summary.baselines);
    println!("Clear:      {}", summary.clear);
    println!("Violations: {}", summary.violations);
    Ok(())
}
