//! Diagnostic sink: where resolution misses and hook failures are reported.
//!
//! The sink never influences control flow; it only observes.

use tracing::Level;

pub trait DiagnosticSink: Send + Sync {
    fn log(&self, level: Level, message: &str);
}

/// Default sink: forwards every diagnostic to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::ERROR => tracing::error!(target: "switchboard", "{message}"),
            Level::WARN => tracing::warn!(target: "switchboard", "{message}"),
            Level::INFO => tracing::info!(target: "switchboard", "{message}"),
            Level::DEBUG => tracing::debug!(target: "switchboard", "{message}"),
            _ => tracing::trace!(target: "switchboard", "{message}"),
        }
    }
}

/// Install a `tracing` subscriber on stderr honouring `RUST_LOG` (default `info`).
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
