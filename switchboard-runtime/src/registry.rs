//! Per-run registries of connections and models.
//!
//! Both keep declaration order and unique names. Stage tasks never touch a
//! registry directly: each task is handed a slot (its connection or model
//! index) and returns its result, which the orchestrator writes back between
//! joins. Writes are therefore key-disjoint by construction.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use switchboard_core::{
    find_owner, Adapter, ConnectionName, Handle, ModelName, ModelSet, RealizedModel, RefineModels,
    ResolutionRule, Route, ValidatedConnection,
};

// ---------------------------------------------------------------------------
// Connections
// ---------------------------------------------------------------------------

/// A connection with a live handle.
pub struct ConnectionRecord {
    pub name: ConnectionName,
    pub adapter: Arc<dyn Adapter>,
    /// Present when the adapter opted into batch refinement.
    pub refiner: Option<Arc<dyn RefineModels>>,
    pub route: Route,
    pub handle: Handle,
    assigned: Vec<ModelName>,
}

impl ConnectionRecord {
    pub fn new(validated: ValidatedConnection, handle: Handle) -> Self {
        Self {
            name: validated.name,
            adapter: validated.adapter,
            refiner: validated.refiner,
            route: validated.route,
            handle,
            assigned: Vec::new(),
        }
    }

    /// Models resolved to this connection, in order of resolution.
    pub fn assigned_models(&self) -> &[ModelName] {
        &self.assigned
    }

    pub fn supports_refine(&self) -> bool {
        self.refiner.is_some()
    }
}

impl AsRef<Route> for ConnectionRecord {
    fn as_ref(&self) -> &Route {
        &self.route
    }
}

impl fmt::Debug for ConnectionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRecord")
            .field("name", &self.name)
            .field("route", &self.route)
            .field("supports_refine", &self.supports_refine())
            .field("assigned", &self.assigned)
            .finish()
    }
}

/// Initialized connections in declaration order.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    records: Vec<ConnectionRecord>,
}

impl ConnectionRegistry {
    pub(crate) fn from_records(records: Vec<ConnectionRecord>) -> Self {
        Self { records }
    }

    pub fn get(&self, name: &str) -> Option<&ConnectionRecord> {
        self.records.iter().find(|r| r.name.0 == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConnectionRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Pick the connection that owns `model` and record the assignment on it.
    ///
    /// Call exactly once per model: every successful call appends to the
    /// owner's assigned models, and post-processing relies on that list.
    pub fn resolve(&mut self, model: &ModelName) -> Option<(&ConnectionRecord, ResolutionRule)> {
        let resolution = find_owner(model.as_str(), self.records.as_slice())?;
        let record = &mut self.records[resolution.index];
        record.assigned.push(model.clone());
        Some((&*record, resolution.rule))
    }
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

/// A model registry entry: the caller's config until an adapter realizes it.
#[derive(Debug, Clone)]
pub enum ModelEntry {
    Declared(Value),
    Realized(RealizedModel),
}

impl ModelEntry {
    pub fn as_realized(&self) -> Option<&RealizedModel> {
        match self {
            ModelEntry::Realized(model) => Some(model),
            ModelEntry::Declared(_) => None,
        }
    }

    pub fn is_realized(&self) -> bool {
        matches!(self, ModelEntry::Realized(_))
    }
}

/// Models in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    entries: Vec<(ModelName, ModelEntry)>,
}

impl ModelRegistry {
    pub fn from_declared(models: Vec<(ModelName, Value)>) -> Self {
        Self {
            entries: models
                .into_iter()
                .map(|(name, config)| (name, ModelEntry::Declared(config)))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ModelEntry> {
        self.entries.iter().find(|(n, _)| n.0 == name).map(|(_, e)| e)
    }

    /// The realized value of `name`, if it has one.
    pub fn realized(&self, name: &str) -> Option<&RealizedModel> {
        self.get(name).and_then(ModelEntry::as_realized)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ModelName, &ModelEntry)> {
        self.entries.iter().map(|(n, e)| (n, e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write a realized model into the slot handed out for it.
    pub(crate) fn realize_at(&mut self, index: usize, model: RealizedModel) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.1 = ModelEntry::Realized(model);
        }
    }

    /// The realized models among `names`.
    pub fn subset(&self, names: &[ModelName]) -> ModelSet {
        names
            .iter()
            .filter_map(|name| {
                self.realized(name.as_str())
                    .map(|model| (name.clone(), model.clone()))
            })
            .collect()
    }

    /// Replace entries by name with `refined`; names not yet present are
    /// appended. Entries not in `refined` are untouched.
    pub fn merge(&mut self, refined: ModelSet) {
        for (name, model) in refined {
            match self.entries.iter_mut().find(|(n, _)| *n == name) {
                Some(entry) => entry.1 = ModelEntry::Realized(model),
                None => self.entries.push((name, ModelEntry::Realized(model))),
            }
        }
    }
}

/// The outcome of a successful run.
#[derive(Debug, Default)]
pub struct Wiring {
    pub connections: ConnectionRegistry,
    pub models: ModelRegistry,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> ModelRegistry {
        ModelRegistry::from_declared(vec![
            (ModelName::from("post"), json!({ "collection": "posts" })),
            (ModelName::from("user"), json!({ "table": "users" })),
        ])
    }

    #[test]
    fn realize_at_replaces_only_its_slot() {
        let mut models = registry();
        models.realize_at(1, RealizedModel::new(String::from("users-model")));
        assert!(!models.get("post").expect("post").is_realized());
        assert_eq!(
            models
                .realized("user")
                .and_then(|m| m.downcast_ref::<String>())
                .map(String::as_str),
            Some("users-model")
        );
    }

    #[test]
    fn subset_skips_unrealized_and_unknown() {
        let mut models = registry();
        models.realize_at(0, RealizedModel::new(1u8));
        let subset = models.subset(&[
            ModelName::from("post"),
            ModelName::from("user"),
            ModelName::from("ghost"),
        ]);
        assert_eq!(subset.keys().cloned().collect::<Vec<_>>(), vec![ModelName::from("post")]);
    }

    #[test]
    fn merge_replaces_by_name_and_keeps_the_rest() {
        let mut models = registry();
        let original = RealizedModel::new("post-v1");
        models.realize_at(0, original.clone());
        models.realize_at(1, RealizedModel::new("user-v1"));

        let refined = RealizedModel::new("user-v2");
        let mut set = ModelSet::new();
        set.insert(ModelName::from("user"), refined.clone());
        models.merge(set);

        assert!(models.realized("post").expect("post").ptr_eq(&original));
        assert!(models.realized("user").expect("user").ptr_eq(&refined));
        assert_eq!(models.len(), 2);
    }

    #[test]
    fn merge_appends_unknown_names() {
        let mut models = registry();
        let mut set = ModelSet::new();
        set.insert(ModelName::from("audit"), RealizedModel::new(()));
        models.merge(set);
        let names: Vec<&str> = models.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["post", "user", "audit"]);
    }
}
