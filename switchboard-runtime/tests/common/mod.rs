//! In-memory adapter doubles that record every hook call.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use switchboard_core::{
    Adapter, BoxError, Handle, ModelName, ModelSet, RealizedModel, RefineModels,
};
use switchboard_runtime::DiagnosticSink;
use tracing::Level;

static NEXT_ID: AtomicUsize = AtomicUsize::new(1);

/// Handle produced by [`MemoryAdapter::connect`].
#[derive(Debug)]
pub struct Connection {
    pub id: usize,
    pub adapter: String,
    pub config: Value,
}

/// Realized model produced by [`MemoryAdapter::realize_model`].
#[derive(Debug)]
pub struct Model {
    pub connection_id: usize,
    pub adapter: String,
    pub config: Value,
    pub refined: bool,
}

/// What the refine hook does, when the adapter offers one.
#[derive(Debug, Clone)]
pub enum Refine {
    /// Return every model, rebuilt with `refined: true`.
    All,
    /// Return only the named models, rebuilt with `refined: true`.
    Only(Vec<&'static str>),
    Fail,
}

#[derive(Debug, Default)]
pub struct Calls {
    pub connects: Vec<Value>,
    pub realized: Vec<Value>,
    /// One entry per refine call: the connection id and the names it was given.
    pub refined: Vec<(usize, Vec<ModelName>)>,
}

#[derive(Debug, Default)]
pub struct MemoryAdapter {
    name: String,
    refine: Option<Refine>,
    fail_connect: bool,
    connect_delay: Option<Duration>,
    calls: Mutex<Calls>,
}

impl MemoryAdapter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn refining(mut self, refine: Refine) -> Self {
        self.refine = Some(refine);
        self
    }

    pub fn failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    pub fn slow_connect(mut self, delay: Duration) -> Self {
        self.connect_delay = Some(delay);
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> std::sync::MutexGuard<'_, Calls> {
        self.calls.lock().expect("calls lock")
    }
}

#[async_trait]
impl Adapter for MemoryAdapter {
    async fn connect(&self, config: Value) -> Result<Handle, BoxError> {
        if let Some(delay) = self.connect_delay {
            tokio::time::sleep(delay).await;
        }
        self.calls().connects.push(config.clone());
        if self.fail_connect {
            return Err("something unexpected".into());
        }
        Ok(Handle::new(Connection {
            id: NEXT_ID.fetch_add(1, Ordering::SeqCst),
            adapter: self.name.clone(),
            config,
        }))
    }

    /// Fails for model configs carrying `"fail": true`.
    async fn realize_model(&self, handle: &Handle, model: Value) -> Result<RealizedModel, BoxError> {
        self.calls().realized.push(model.clone());
        if model.get("fail").and_then(Value::as_bool) == Some(true) {
            return Err("something unexpected".into());
        }
        let connection = handle
            .downcast_ref::<Connection>()
            .ok_or("handle is not a memory connection")?;
        Ok(RealizedModel::new(Model {
            connection_id: connection.id,
            adapter: self.name.clone(),
            config: model,
            refined: false,
        }))
    }

    fn refiner(self: Arc<Self>) -> Option<Arc<dyn RefineModels>> {
        if self.refine.is_some() {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl RefineModels for MemoryAdapter {
    async fn refine_models(&self, handle: &Handle, models: ModelSet) -> Result<ModelSet, BoxError> {
        let connection_id = handle
            .downcast_ref::<Connection>()
            .map(|c| c.id)
            .ok_or("handle is not a memory connection")?;
        self.calls()
            .refined
            .push((connection_id, models.keys().cloned().collect()));

        let only: Option<Vec<&'static str>> = match &self.refine {
            Some(Refine::All) | None => None,
            Some(Refine::Only(names)) => Some(names.clone()),
            Some(Refine::Fail) => return Err("something unexpected".into()),
        };

        let mut refined = ModelSet::new();
        for (name, model) in models {
            if let Some(names) = &only {
                if !names.iter().any(|k| *k == name.as_str()) {
                    continue;
                }
            }
            let model = model.downcast_ref::<Model>().ok_or("not a memory model")?;
            refined.insert(
                name,
                RealizedModel::new(Model {
                    connection_id: model.connection_id,
                    adapter: model.adapter.clone(),
                    config: model.config.clone(),
                    refined: true,
                }),
            );
        }
        Ok(refined)
    }
}

/// Sink that keeps every diagnostic for later assertions.
#[derive(Debug, Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<(Level, String)>>,
}

impl RecordingSink {
    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries.lock().expect("sink lock").clone()
    }
}

impl DiagnosticSink for RecordingSink {
    fn log(&self, level: Level, message: &str) {
        self.entries
            .lock()
            .expect("sink lock")
            .push((level, message.to_string()));
    }
}

/// The memory model realized for `name`, panicking if it is missing.
pub fn model<'a>(models: &'a switchboard_runtime::ModelRegistry, name: &str) -> &'a Model {
    models
        .realized(name)
        .and_then(|m| m.downcast_ref::<Model>())
        .unwrap_or_else(|| panic!("model '{name}' was not realized"))
}

/// The memory connection behind `name`, panicking if it is missing.
pub fn connection<'a>(
    connections: &'a switchboard_runtime::ConnectionRegistry,
    name: &str,
) -> &'a Connection {
    connections
        .get(name)
        .and_then(|r| r.handle.downcast_ref::<Connection>())
        .unwrap_or_else(|| panic!("connection '{name}' has no memory handle"))
}
