//! Demo command implementation.
//!
//! Runs the three scenarios the pipeline exists for: sealing normal lines,
//! catching a segregation-of-duties sequence, and catching a tampered line.

use alisa_core::integrity;
use alisa_pipeline::build_pipeline;
use alisa_test::LogGenerator;
use anyhow::{Context, Result};
use clap::Args;

use super::process::{process_line, Tally};
use super::ConfigArgs;

/// Arguments for the demo command.
#[derive(Args)]
pub struct DemoArgs {
    /// Seed for the log generator (random if omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Normal lines to seal in phase 1
    #[arg(long, default_value = "3")]
    pub normal: usize,
}

/// Runs the demo command.
pub async fn run(config: &ConfigArgs, args: &DemoArgs) -> Result<()> {
    let config = config.resolve()?;
    let pipeline = build_pipeline(&config).context("Failed to build pipeline")?;
    let mut generator = args.seed.map_or_else(LogGenerator::new, LogGenerator::seeded);
    let mut tally = Tally::default();

    println!("ALISA Demo");
    println!("==========");

    println!("\n--- Phase 1: Real-Time Log Sealing ---");
    for _ in 0..args.normal {
        let line = generator.normal_log();
        tally.record(&process_line(&pipeline, &line, None).await?);
    }

    println!("\n--- Phase 2: SoD Violation Detection ---");
    for line in generator.sod_violation_sequence() {
        tally.record(&process_line(&pipeline, &line, None).await?);
    }

    println!("\n--- Phase 3: Tampering Detection ---");
    let pair = generator.tampered_pair();
    let baseline = integrity::digest(&pair.original);
    println!("Original Log:  {}", pair.original);
    println!("Tampered Log:  {}", pair.tampered);
    println!("Baseline Hash: {baseline}");
    tally.record(&process_line(&pipeline, &pair.tampered, Some(&baseline)).await?);

    tally.print();
    println!();
    println!("Audit trail: {}", config.storage.database.display());
    println!("Evidence:    {}", config.storage.artifacts_dir.display());
    Ok(())
}
