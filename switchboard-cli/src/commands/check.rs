//! `switchboard check` — structural validation of connection declarations.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;

use switchboard_core::{check_shape, ValidationError};

use super::load_manifest;

/// Arguments for `switchboard check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to the YAML manifest.
    pub manifest: PathBuf,
}

impl CheckArgs {
    pub fn run(self) -> Result<()> {
        let declarations = load_manifest(&self.manifest)?;
        let total = declarations.connections.len();

        // Adapter names are not bound here: the CLI has no adapters to offer.
        let violations: Vec<ValidationError> = declarations
            .connections
            .iter()
            .filter_map(|(name, decl)| check_shape(name, decl).err())
            .collect();

        if violations.is_empty() {
            println!(
                "✓ {} connection(s) and {} model(s) in {}",
                total,
                declarations.models.len(),
                self.manifest.display()
            );
            return Ok(());
        }

        for violation in &violations {
            println!("{} {violation}", "✗".red());
        }
        bail!("{} of {} connection(s) failed validation", violations.len(), total)
    }
}
