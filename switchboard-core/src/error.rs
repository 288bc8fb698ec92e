//! Error types for switchboard-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::ConnectionName;

/// A connection declaration that does not have the shape the pipeline needs.
///
/// Detected before any adapter hook is called.
#[derive(Debug, Error)]
#[error("invalid connection '{connection}': {violation}")]
pub struct ValidationError {
    pub connection: ConnectionName,
    #[source]
    pub violation: Violation,
}

impl ValidationError {
    pub fn new(connection: impl Into<ConnectionName>, violation: Violation) -> Self {
        Self {
            connection: connection.into(),
            violation,
        }
    }
}

/// The first structural problem found in a connection declaration.
#[derive(Debug, Error)]
pub enum Violation {
    #[error("declaration must be a mapping, found {found}")]
    NotAMapping { found: &'static str },

    #[error("missing adapter")]
    MissingAdapter,

    #[error("`adapter` must be an adapter name, found {found}")]
    AdapterNotAName { found: &'static str },

    #[error("no adapter registered under '{name}'")]
    UnknownAdapter { name: String },

    #[error("`config` must be a mapping or a factory, found {found}")]
    InvalidConfig { found: &'static str },

    #[error("`default` must be a boolean, found {found}")]
    InvalidDefault { found: &'static str },

    #[error("`models` must be a sequence, found {found}")]
    InvalidMatchers { found: &'static str },

    #[error("`models[{index}]` must be a string or a {{ pattern }} mapping, found {found}")]
    InvalidMatcher { index: usize, found: &'static str },

    #[error("`models[{index}]` is not a valid pattern: {source}")]
    InvalidPattern {
        index: usize,
        #[source]
        source: regex::Error,
    },
}

/// Errors from loading a declarations manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("failed to read manifest at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error, with the manifest path when loaded from disk.
    #[error("failed to parse manifest{}: {source}", path_suffix(.path))]
    Parse {
        path: Option<PathBuf>,
        #[source]
        source: serde_yaml::Error,
    },

    /// A top-level section (`connections`, `models`) that is not a mapping.
    #[error("manifest section `{section}` must be a mapping, found {found}")]
    InvalidSection {
        section: &'static str,
        found: &'static str,
    },
}

fn path_suffix(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!(" at {}", p.display()),
        None => String::new(),
    }
}
