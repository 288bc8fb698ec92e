use thiserror::Error;

use switchboard_core::{BoxError, ConnectionName, ModelName, ValidationError};

use crate::pipeline::Stage;

/// The first failure of a pipeline run.
///
/// Each variant carries only the name of the connection or model that failed;
/// adapter errors are kept as the `source`.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to register connection '{connection}': {source}")]
    ConnectionRegistration {
        connection: ConnectionName,
        #[source]
        source: BoxError,
    },

    #[error("unable to locate connection for model '{model}'")]
    ModelResolution { model: ModelName },

    #[error("failed to register model '{model}': {source}")]
    ModelRegistration {
        model: ModelName,
        #[source]
        source: BoxError,
    },

    #[error("failed to post-process models for connection '{connection}': {source}")]
    ModelPostProcessing {
        connection: ConnectionName,
        #[source]
        source: BoxError,
    },

    /// A hook panicked (or its task was otherwise lost) before reporting.
    #[error("{stage} task did not complete: {message}")]
    TaskPanicked { stage: Stage, message: String },
}

impl PipelineError {
    /// The stage this error ends the run in.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Validation(_) | PipelineError::ConnectionRegistration { .. } => {
                Stage::InitializingConnections
            }
            PipelineError::ModelResolution { .. } | PipelineError::ModelRegistration { .. } => {
                Stage::InitializingModels
            }
            PipelineError::ModelPostProcessing { .. } => Stage::PostProcessingModels,
            PipelineError::TaskPanicked { stage, .. } => *stage,
        }
    }
}
