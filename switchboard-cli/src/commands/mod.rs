pub mod check;
pub mod plan;

use std::path::Path;

use anyhow::{Context, Result};
use switchboard_core::Declarations;

/// Load a manifest, naming it in the error.
pub(crate) fn load_manifest(path: &Path) -> Result<Declarations> {
    Declarations::load_at(path).with_context(|| format!("failed to load manifest {}", path.display()))
}
