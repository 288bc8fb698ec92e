//! Switchboard — inspect connection and model manifests before wiring them.
//!
//! # Usage
//!
//! ```text
//! switchboard check <manifest>
//! switchboard plan <manifest> [--json]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{check::CheckArgs, plan::PlanArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "switchboard",
    version,
    about = "Validate and preview how declared models resolve to connections",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check every connection declaration in a manifest.
    Check(CheckArgs),

    /// Show which connection each declared model resolves to.
    Plan(PlanArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    switchboard_runtime::init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Check(args) => args.run(),
        Commands::Plan(args) => args.run(),
    }
}
