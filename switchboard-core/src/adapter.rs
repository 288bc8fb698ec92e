//! The adapter capability contract and the name → adapter catalog.
//!
//! An adapter knows how to connect to one kind of backend and how to realize
//! models against the resulting handle. `connect` and `realize_model` are
//! required; batch refinement is an optional second interface an adapter hands
//! out through [`Adapter::refiner`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::types::{Handle, ModelName, RealizedModel};

/// Error type returned by adapter hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Models handed to, and returned from, a refine hook.
pub type ModelSet = BTreeMap<ModelName, RealizedModel>;

/// Required adapter operations.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Open a connection from a resolved config value.
    async fn connect(&self, config: Value) -> Result<Handle, BoxError>;

    /// Realize one model's declared config against a live handle.
    async fn realize_model(&self, handle: &Handle, model: Value) -> Result<RealizedModel, BoxError>;

    /// The optional batch-refine capability.
    ///
    /// Probed once when a connection is validated. Returning `None` declines
    /// refinement; it is never an error. Implementors that refine return
    /// `Some(self)`.
    fn refiner(self: Arc<Self>) -> Option<Arc<dyn RefineModels>> {
        None
    }
}

/// Optional adapter operation: post-process every model a connection owns.
#[async_trait]
pub trait RefineModels: Send + Sync {
    /// Receives the subset of realized models assigned to `handle`'s
    /// connection. Entries in the returned set replace registry entries of
    /// the same name; omitted names are left as they were.
    async fn refine_models(&self, handle: &Handle, models: ModelSet) -> Result<ModelSet, BoxError>;
}

/// Adapters available to declarations that name their adapter by string.
#[derive(Clone, Default)]
pub struct AdapterCatalog {
    adapters: HashMap<String, Arc<dyn Adapter>>,
}

impl AdapterCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `adapter` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, adapter: Arc<dyn Adapter>) -> &mut Self {
        self.adapters.insert(name.into(), adapter);
        self
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, name: impl Into<String>, adapter: Arc<dyn Adapter>) -> Self {
        self.register(name, adapter);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Adapter>> {
        self.adapters.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.adapters.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for AdapterCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterCatalog")
            .field("adapters", &self.names())
            .finish()
    }
}
