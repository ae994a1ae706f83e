//! Hash command implementation.

use alisa_core::integrity;
use clap::Args;

/// Arguments for the hash command.
#[derive(Args)]
pub struct HashArgs {
    /// Log line to digest
    pub text: String,
}

/// Runs the hash command.
pub fn run(args: &HashArgs) {
    println!("{}", integrity::digest(&args.text));
}
