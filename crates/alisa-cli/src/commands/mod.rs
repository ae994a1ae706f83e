//! CLI commands and argument parsing.

pub mod demo;
pub mod findings;
pub mod hash;
pub mod policy;
pub mod process;
pub mod seed;
pub mod verify;

use std::path::PathBuf;

use alisa_core::PolicyFailureMode;
use alisa_extract::ExtractorKind;
use alisa_pipeline::PipelineConfig;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::debug;

/// ALISA - Log integrity and segregation-of-duties auditing
#[derive(Parser)]
#[command(name = "alisa")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration and overrides shared by every command
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run log lines through the audit pipeline
    Process(process::ProcessArgs),

    /// Run the three-phase demonstration scenario
    Demo(demo::DemoArgs),

    /// Fill the audit trail with synthetic history
    Seed(seed::SeedArgs),

    /// Print the integrity digest of a line
    Hash(hash::HashArgs),

    /// Re-verify every stored baseline against its digest
    Verify,

    /// Show the rules of a conflict policy
    Policy(policy::PolicyArgs),

    /// List audit findings
    Findings(findings::FindingsArgs),

    /// Print version information
    Version,
}

/// Extractor selection on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExtractorChoice {
    /// Local Ollama model
    Ollama,
    /// Textual pattern only
    Pattern,
}

impl From<ExtractorChoice> for ExtractorKind {
    fn from(choice: ExtractorChoice) -> Self {
        match choice {
            ExtractorChoice::Ollama => Self::Ollama,
            ExtractorChoice::Pattern => Self::Pattern,
        }
    }
}

/// Configuration file and per-field overrides.
#[derive(Args, Debug, Default, Clone)]
pub struct ConfigArgs {
    /// Path to the pipeline configuration file
    #[arg(long, global = true, env = "ALISA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Conflict policy file
    #[arg(long, global = true)]
    pub policy: Option<PathBuf>,

    /// SQLite database path, or :memory:
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// Directory for evidence artifacts
    #[arg(long, global = true)]
    pub artifacts_dir: Option<PathBuf>,

    /// Extractor to use
    #[arg(long, global = true, value_enum)]
    pub extractor: Option<ExtractorChoice>,

    /// Continue with an empty policy if it cannot be loaded
    #[arg(long, global = true)]
    pub fail_open: bool,
}

impl ConfigArgs {
    /// Loads the configuration file, if any, and applies the overrides.
    pub fn resolve(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => PipelineConfig::default(),
        };

        if let Some(policy) = &self.policy {
            config.policy.path.clone_from(policy);
        }
        if let Some(database) = &self.database {
            config.storage.database.clone_from(database);
        }
        if let Some(dir) = &self.artifacts_dir {
            config.storage.artifacts_dir.clone_from(dir);
        }
        if let Some(extractor) = self.extractor {
            config.extractor.kind = extractor.into();
        }
        if self.fail_open {
            config.policy.on_error = PolicyFailureMode::Open;
        }

        debug!(?config, "Resolved configuration");
        Ok(config)
    }
}
