//! Stage 2: resolve every model to its connection and realize it there, all
//! models concurrently.

use std::sync::Arc;

use tracing::Level;

use switchboard_core::ModelName;

use crate::error::PipelineError;
use crate::pipeline::Stage;
use crate::registry::{ConnectionRegistry, ModelEntry, ModelRegistry};
use crate::sink::DiagnosticSink;
use crate::task_group::TaskGroup;

pub(crate) async fn initialize_models(
    connections: &mut ConnectionRegistry,
    models: &mut ModelRegistry,
    sink: &Arc<dyn DiagnosticSink>,
) -> Result<(), PipelineError> {
    if models.is_empty() {
        return Ok(());
    }

    let pending: Vec<(usize, ModelName, serde_json::Value)> = models
        .iter()
        .enumerate()
        .filter_map(|(index, (name, entry))| match entry {
            ModelEntry::Declared(config) => Some((index, name.clone(), config.clone())),
            ModelEntry::Realized(_) => None,
        })
        .collect();

    let mut group = TaskGroup::new(Stage::InitializingModels);
    for (index, name, config) in pending {
        // Resolution happens here, once per model, so assignments are
        // recorded in declaration order before any hook runs.
        let Some((record, rule)) = connections.resolve(&name) else {
            sink.log(
                Level::INFO,
                &format!("Unable to locate connection for model: {name}"),
            );
            group.spawn(async move { Err(PipelineError::ModelResolution { model: name }) });
            continue;
        };

        tracing::debug!(model = %name, connection = %record.name, %rule, "model resolved");
        let adapter = Arc::clone(&record.adapter);
        let handle = record.handle.clone();
        let sink = Arc::clone(sink);
        group.spawn(async move {
            match adapter.realize_model(&handle, config).await {
                Ok(realized) => Ok((index, realized)),
                Err(source) => {
                    sink.log(Level::ERROR, &format!("Error registering model: {name}"));
                    Err(PipelineError::ModelRegistration { model: name, source })
                }
            }
        });
    }

    group
        .settle(|(index, realized)| models.realize_at(index, realized))
        .await
}
