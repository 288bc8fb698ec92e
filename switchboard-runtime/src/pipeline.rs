//! The orchestrator: runs the stages in order, each as a barrier.
//!
//! ```text
//! Idle → InitializingConnections → InitializingModels → PostProcessingModels → Done
//!   │             └──────────────────────┴─────────────────────┴──────────→ Failed
//!   └─ no connections declared ────────────────────────────────────────────→ Done
//! ```
//!
//! A stage starts only after the previous one settled: model resolution needs
//! every connection handle, and refinement needs every model realized and
//! every assignment recorded.

use std::fmt;
use std::sync::Arc;

use tokio::time::Instant;

use switchboard_core::{AdapterCatalog, Declarations};

use crate::connections::initialize_connections;
use crate::error::PipelineError;
use crate::models::initialize_models;
use crate::refine::post_process_models;
use crate::registry::{ModelRegistry, Wiring};
use crate::sink::{DiagnosticSink, TracingSink};

/// Pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Idle,
    InitializingConnections,
    InitializingModels,
    PostProcessingModels,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Idle => write!(f, "idle"),
            Stage::InitializingConnections => write!(f, "initializing connections"),
            Stage::InitializingModels => write!(f, "initializing models"),
            Stage::PostProcessingModels => write!(f, "post-processing models"),
            Stage::Done => write!(f, "done"),
            Stage::Failed => write!(f, "failed"),
        }
    }
}

/// Wires declared connections and models through their adapters.
///
/// A run either returns the complete [`Wiring`] or the first error. Registries
/// of a failed run are discarded; tasks still in flight when the failure was
/// observed finish in the background.
#[derive(Clone)]
pub struct Pipeline {
    catalog: Arc<AdapterCatalog>,
    sink: Arc<dyn DiagnosticSink>,
}

impl Pipeline {
    pub fn new(catalog: AdapterCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
            sink: Arc::new(TracingSink),
        }
    }

    /// Replace the default `tracing` diagnostic sink.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn catalog(&self) -> &AdapterCatalog {
        &self.catalog
    }

    pub async fn run(&self, declarations: Declarations) -> Result<Wiring, PipelineError> {
        let started = Instant::now();
        let mut run = Run::default();
        let Declarations { connections, models } = declarations;

        if connections.is_empty() {
            if !models.is_empty() {
                tracing::warn!(
                    models = models.len(),
                    "models declared without any connection; nothing to wire"
                );
            }
            run.advance(Stage::Done);
            return Ok(Wiring {
                models: ModelRegistry::from_declared(models),
                ..Wiring::default()
            });
        }

        run.advance(Stage::InitializingConnections);
        let mut connection_registry = initialize_connections(connections, &self.catalog, &self.sink)
            .await
            .map_err(|err| run.fail(err))?;

        run.advance(Stage::InitializingModels);
        let mut model_registry = ModelRegistry::from_declared(models);
        initialize_models(&mut connection_registry, &mut model_registry, &self.sink)
            .await
            .map_err(|err| run.fail(err))?;

        run.advance(Stage::PostProcessingModels);
        post_process_models(&connection_registry, &mut model_registry, &self.sink)
            .await
            .map_err(|err| run.fail(err))?;

        run.advance(Stage::Done);
        tracing::info!(
            connections = connection_registry.len(),
            models = model_registry.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "wiring complete"
        );
        Ok(Wiring {
            connections: connection_registry,
            models: model_registry,
        })
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}

/// Run `declarations` once against `catalog`, reporting to `tracing`.
pub async fn run(declarations: Declarations, catalog: AdapterCatalog) -> Result<Wiring, PipelineError> {
    Pipeline::new(catalog).run(declarations).await
}

#[derive(Debug, Default)]
struct Run {
    stage: Stage,
}

impl Run {
    fn advance(&mut self, next: Stage) {
        tracing::debug!(from = %self.stage, to = %next, "pipeline stage");
        self.stage = next;
    }

    fn fail(&mut self, err: PipelineError) -> PipelineError {
        tracing::error!(stage = %self.stage, error = %err, "pipeline failed");
        self.stage = Stage::Failed;
        err
    }
}
