//! Verify command implementation.
//!
//! Replays every stored baseline through the integrity check, offline.

use alisa_audit::AuditStore;
use alisa_pipeline::bootstrap;
use anyhow::{bail, Context, Result};
use tracing::warn;

use super::ConfigArgs;

/// Runs the verify command.
pub fn run(config: &ConfigArgs) -> Result<()> {
    let config = config.resolve()?;
    let store = bootstrap::open_store(&config.storage).context("Failed to open audit trail")?;
    let baselines = store.baselines().context("Failed to read baselines")?;

    println!("ALISA Integrity Verification");
    println!("============================");
    println!("Database: {}", config.storage.database.display());
    println!();

    let mut mismatched = 0usize;
    for baseline in &baselines {
        if !baseline.verify() {
            mismatched += 1;
            warn!(log_id = %baseline.log_id, "Stored log line no longer matches its digest");
            println!("✗ [LogID {}] {}", baseline.log_id, baseline.log_line);
        }
    }

    println!("Checked: {}", baselines.len());
    if mismatched > 0 {
        bail!("{mismatched} baseline(s) failed integrity verification");
    }

    println!("✓ All baselines verified");
    Ok(())
}
