//! Process command implementation.

use std::fs;
use std::io::{self, BufRead};
use std::path::PathBuf;

use alisa_core::IntegrityDigest;
use alisa_pipeline::{build_pipeline, AuditPipeline, PipelineVerdict};
use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::info;

use super::ConfigArgs;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// File with one log line per line (reads stdin if omitted)
    pub file: Option<PathBuf>,

    /// Process this single line instead of a file
    #[arg(long, conflicts_with = "file")]
    pub line: Option<String>,

    /// Baseline digest the line must match, as hex
    #[arg(long, requires = "line")]
    pub expect_hash: Option<String>,
}

/// Counts of pipeline outcomes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    /// Lines with a clear verdict.
    pub clear: usize,
    /// Lines that raised at least one violation.
    pub violations: usize,
    /// Lines aborted by the integrity check.
    pub tampered: usize,
}

impl Tally {
    /// Counts `verdict`.
    pub fn record(&mut self, verdict: &PipelineVerdict) {
        match verdict {
            PipelineVerdict::Completed(report) if report.violations.is_empty() => self.clear += 1,
            PipelineVerdict::Completed(_) => self.violations += 1,
            PipelineVerdict::Aborted(_) => self.tampered += 1,
        }
    }

    /// Total lines counted.
    pub const fn total(&self) -> usize {
        self.clear + self.violations + self.tampered
    }

    /// Prints the counts.
    pub fn print(&self) {
        println!();
        println!("Processed: {}", self.total());
        println!("  Clear:      {}", self.clear);
        println!("  Violations: {}", self.violations);
        println!("  Tampered:   {}", self.tampered);
    }
}

/// Runs the process command.
pub async fn run(config: &ConfigArgs, args: &ProcessArgs) -> Result<()> {
    let config = config.resolve()?;
    let pipeline = build_pipeline(&config).context("Failed to build pipeline")?;

    let expected = args
        .expect_hash
        .as_deref()
        .map(str::parse::<IntegrityDigest>)
        .transpose()
        .context("Invalid --expect-hash")?;

    let lines = read_lines(args)?;
    info!(lines = lines.len(), "Processing log lines");

    let mut tally = Tally::default();
    for line in &lines {
        let verdict = process_line(&pipeline, line, expected.as_ref()).await?;
        tally.record(&verdict);
    }

    tally.print();
    if tally.tampered > 0 {
        bail!("{} line(s) failed integrity verification", tally.tampered);
    }
    Ok(())
}

/// Processes one line and prints the outcome.
pub async fn process_line(
    pipeline: &AuditPipeline,
    line: &str,
    expected: Option<&IntegrityDigest>,
) -> Result<PipelineVerdict> {
    let verdict = pipeline
        .process(line, expected)
        .await
        .with_context(|| format!("Failed to process: {line}"))?;
    print_verdict(&verdict);
    Ok(verdict)
}

/// Prints one pipeline outcome.
pub fn print_verdict(verdict: &PipelineVerdict) {
    match verdict {
        PipelineVerdict::Completed(report) if report.violations.is_empty() => {
            println!(
                "✓ [LogID {}] Clear ({} / {})",
                report.log_id,
                report.event.actor().unwrap_or("unknown"),
                report.event.action().unwrap_or("unknown"),
            );
        }
        PipelineVerdict::Completed(report) => {
            for violation in &report.violations {
                println!("✗ [LogID {}] {}", report.log_id, violation.message);
            }
        }
        PipelineVerdict::Aborted(tamper) => {
            println!("⚠ Integrity check failed");
            println!("  Expected: {}", tamper.expected);
            println!("  Actual:   {}", tamper.actual);
            println!("  Evidence: {}", tamper.evidence_id);
        }
    }
}

fn read_lines(args: &ProcessArgs) -> Result<Vec<String>> {
    let lines = match (&args.line, &args.file) {
        (Some(line), _) => vec![line.clone()],
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
            .lines()
            .map(str::to_string)
            .collect(),
        (None, None) => io::stdin()
            .lock()
            .lines()
            .collect::<io::Result<Vec<_>>>()
            .context("Failed to read stdin")?,
    };

    // Lines are digested as read; only blank ones are skipped.
    Ok(lines
        .into_iter()
        .filter(|l| !l.trim().is_empty())
        .collect())
}
