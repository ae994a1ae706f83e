//! Policy command implementation.

use std::path::PathBuf;

use alisa_core::ConflictPolicy;
use anyhow::{Context, Result};
use clap::Args;

use super::ConfigArgs;

/// Arguments for the policy command.
#[derive(Args)]
pub struct PolicyArgs {
    /// Policy file (defaults to the configured one)
    pub path: Option<PathBuf>,
}

/// Runs the policy command.
pub fn run(config: &ConfigArgs, args: &PolicyArgs) -> Result<()> {
    let path = match &args.path {
        Some(path) => path.clone(),
        None => config.resolve()?.policy.path,
    };
    let policy = ConflictPolicy::load(&path)
        .with_context(|| format!("Failed to load policy {}", path.display()))?;

    println!("ALISA Conflict Policy");
    println!("=====================");
    println!("Path:  {}", path.display());
    println!("Rules: {}", policy.rules().len());
    println!("Pairs: {}", policy.pair_count());

    for (i, rule) in policy.rules().iter().enumerate() {
        let marker = if i == 0 { " (primary)" } else { "" };
        println!();
        println!("{} [{}]{marker}", rule.name, rule.control_id);
        if let Some(description) = &rule.description {
            println!("  {description}");
        }
        for pair in &rule.pairs {
            println!("  - {} + {}", pair.first, pair.second);
        }
    }
    Ok(())
}
