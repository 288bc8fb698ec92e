//! Stage 3: let each connection's adapter refine the models it owns, as one
//! batch per connection.

use std::sync::Arc;

use tracing::Level;

use crate::error::PipelineError;
use crate::pipeline::Stage;
use crate::registry::{ConnectionRegistry, ModelRegistry};
use crate::sink::DiagnosticSink;
use crate::task_group::TaskGroup;

/// Connections without assigned models, or whose adapter declined the refine
/// capability, are skipped.
pub(crate) async fn post_process_models(
    connections: &ConnectionRegistry,
    models: &mut ModelRegistry,
    sink: &Arc<dyn DiagnosticSink>,
) -> Result<(), PipelineError> {
    let mut group = TaskGroup::new(Stage::PostProcessingModels);

    for record in connections.iter() {
        let Some(refiner) = record.refiner.clone() else {
            continue;
        };
        if record.assigned_models().is_empty() {
            continue;
        }

        let subset = models.subset(record.assigned_models());
        let name = record.name.clone();
        let handle = record.handle.clone();
        let sink = Arc::clone(sink);
        tracing::debug!(connection = %name, models = subset.len(), "refining models");
        group.spawn(async move {
            refiner.refine_models(&handle, subset).await.map_err(|source| {
                sink.log(
                    Level::ERROR,
                    &format!("Error processing models for connection: {name}"),
                );
                PipelineError::ModelPostProcessing {
                    connection: name,
                    source,
                }
            })
        });
    }

    group.settle(|refined| models.merge(refined)).await
}
