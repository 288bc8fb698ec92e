//! Stage 1: validate every connection declaration and open it through its
//! adapter, all connections concurrently.

use std::sync::Arc;

use tracing::Level;

use switchboard_core::{
    validate_connection, AdapterCatalog, ConnectionDeclaration, ConnectionName,
};

use crate::error::PipelineError;
use crate::pipeline::Stage;
use crate::registry::{ConnectionRecord, ConnectionRegistry};
use crate::sink::DiagnosticSink;
use crate::task_group::TaskGroup;

pub(crate) async fn initialize_connections(
    declarations: Vec<(ConnectionName, ConnectionDeclaration)>,
    catalog: &Arc<AdapterCatalog>,
    sink: &Arc<dyn DiagnosticSink>,
) -> Result<ConnectionRegistry, PipelineError> {
    let mut slots: Vec<Option<ConnectionRecord>> = Vec::with_capacity(declarations.len());
    let mut group = TaskGroup::new(Stage::InitializingConnections);

    for (index, (name, decl)) in declarations.into_iter().enumerate() {
        slots.push(None);
        let catalog = Arc::clone(catalog);
        let sink = Arc::clone(sink);
        group.spawn(async move {
            let record = register_connection(name, decl, &catalog, sink.as_ref()).await?;
            Ok((index, record))
        });
    }

    group
        .settle(|(index, record)| slots[index] = Some(record))
        .await?;
    Ok(ConnectionRegistry::from_records(
        slots.into_iter().flatten().collect(),
    ))
}

async fn register_connection(
    name: ConnectionName,
    decl: ConnectionDeclaration,
    catalog: &AdapterCatalog,
    sink: &dyn DiagnosticSink,
) -> Result<ConnectionRecord, PipelineError> {
    let validated = validate_connection(&name, &decl, catalog)?;
    let config = validated.config.clone().resolve();

    match validated.adapter.connect(config).await {
        Ok(handle) => {
            tracing::debug!(
                connection = %name,
                refines = validated.refiner.is_some(),
                "connection registered"
            );
            Ok(ConnectionRecord::new(validated, handle))
        }
        Err(source) => {
            sink.log(Level::ERROR, &format!("Error processing connection: {name}"));
            Err(PipelineError::ConnectionRegistration {
                connection: name,
                source,
            })
        }
    }
}
