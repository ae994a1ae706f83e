//! Findings command implementation.

use alisa_audit::{AuditStore, StoredFinding, Verdict};
use alisa_pipeline::bootstrap;
use anyhow::{Context, Result};
use clap::Args;

use super::ConfigArgs;

/// Arguments for the findings command.
#[derive(Args)]
pub struct FindingsArgs {
    /// Only show violations
    #[arg(long)]
    pub violations_only: bool,

    /// Print the rows as JSON
    #[arg(long)]
    pub json: bool,
}

/// Runs the findings command.
pub fn run(config: &ConfigArgs, args: &FindingsArgs) -> Result<()> {
    let config = config.resolve()?;
    let store = bootstrap::open_store(&config.storage).context("Failed to open audit trail")?;
    let findings = filter(store.findings()?, args.violations_only);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&findings)?);
        return Ok(());
    }

    for row in &findings {
        let finding = &row.finding;
        println!(
            "{:>5}  LogID {:>5}  {}  {:<9}  {:<16}  {:<20}  {}",
            row.audit_id.0,
            finding.log_id.0,
            finding.timestamp.format("%Y-%m-%d %H:%M:%S"),
            finding.verdict.as_str(),
            finding.user_id,
            finding.action,
            finding.control_id,
        );
    }
    println!("\n{} finding(s)", findings.len());
    Ok(())
}

fn filter(findings: Vec<StoredFinding>, violations_only: bool) -> Vec<StoredFinding> {
    if violations_only {
        findings
            .into_iter()
            .filter(|f| f.finding.verdict == Verdict::Violation)
            .collect()
    } else {
        findings
    }
}
