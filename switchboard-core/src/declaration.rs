//! Caller-supplied declarations: connections and models, in declaration order.
//!
//! # Manifest layout
//!
//! ```yaml
//! connections:
//!   mongo:
//!     adapter: mongo          # catalog name
//!     config: { url: "mongodb://mongo:27017" }
//!     models: [post, blog, { pattern: "^a" }]
//!   mysql:
//!     adapter: mysql
//!     default: true
//! models:
//!   post: { collection: posts }
//!   user: { table: users }
//! ```
//!
//! Connection declarations are kept loosely shaped until the validator checks
//! them; unknown keys anywhere are ignored. Mapping order in the file is the
//! order used for resolution.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::adapter::Adapter;
use crate::error::ManifestError;
use crate::types::{ConfigFactory, ConnectionName, ModelMatcher, ModelName};

// ---------------------------------------------------------------------------
// Connection declaration
// ---------------------------------------------------------------------------

/// One connection as the host declared it.
///
/// `fields` carries the data form (`adapter` name, `config`, `default`,
/// `models`, plus anything else). An adapter instance or a config factory
/// attached programmatically takes precedence over the matching field.
#[derive(Clone, Default)]
pub struct ConnectionDeclaration {
    pub(crate) fields: Value,
    pub(crate) adapter: Option<Arc<dyn Adapter>>,
    pub(crate) config_factory: Option<ConfigFactory>,
}

impl ConnectionDeclaration {
    /// An empty mapping declaration; add fields with the builder methods.
    pub fn new() -> Self {
        Self {
            fields: Value::Object(Map::new()),
            ..Self::default()
        }
    }

    /// Wrap a raw declaration value as read from a manifest.
    pub fn from_value(fields: Value) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    /// Attach an adapter instance directly (no catalog lookup).
    pub fn adapter(mut self, adapter: Arc<dyn Adapter>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    /// Name the catalog adapter to use.
    pub fn adapter_name(self, name: impl Into<String>) -> Self {
        self.field("adapter", Value::String(name.into()))
    }

    pub fn config(self, config: Value) -> Self {
        self.field("config", config)
    }

    /// Produce the config lazily, once, when the connection is initialized.
    pub fn config_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.config_factory = Some(Arc::new(factory));
        self
    }

    /// Mark this connection as the fallback owner of unmatched models.
    pub fn default_connection(self, is_default: bool) -> Self {
        self.field("default", Value::Bool(is_default))
    }

    pub fn models<I>(self, matchers: I) -> Self
    where
        I: IntoIterator<Item = ModelMatcher>,
    {
        let list = matchers.into_iter().map(|m| m.to_value()).collect();
        self.field("models", Value::Array(list))
    }

    /// Set an arbitrary field. A non-mapping declaration is replaced by a
    /// mapping first.
    pub fn field(mut self, key: impl Into<String>, value: Value) -> Self {
        if !self.fields.is_object() {
            self.fields = Value::Object(Map::new());
        }
        if let Value::Object(map) = &mut self.fields {
            map.insert(key.into(), value);
        }
        self
    }

    pub fn fields(&self) -> &Value {
        &self.fields
    }
}

impl fmt::Debug for ConnectionDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDeclaration")
            .field("fields", &self.fields)
            .field("adapter", &self.adapter.as_ref().map(|_| ".."))
            .field("config_factory", &self.config_factory.as_ref().map(|_| ".."))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

/// Every connection and model a pipeline run should wire, in declaration
/// order. Names are unique: declaring a name twice replaces the first entry in
/// place.
#[derive(Debug, Clone, Default)]
pub struct Declarations {
    pub connections: Vec<(ConnectionName, ConnectionDeclaration)>,
    pub models: Vec<(ModelName, Value)>,
}

impl Declarations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection(mut self, name: impl Into<ConnectionName>, decl: ConnectionDeclaration) -> Self {
        upsert(&mut self.connections, name.into(), decl);
        self
    }

    pub fn model(mut self, name: impl Into<ModelName>, config: Value) -> Self {
        upsert(&mut self.models, name.into(), config);
        self
    }

    /// True when there is nothing to wire.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Parse a YAML manifest.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ManifestError> {
        let root = parse_yaml(yaml).map_err(|source| ManifestError::Parse { path: None, source })?;
        Self::from_manifest_value(root)
    }

    /// Load a YAML manifest from `path`.
    pub fn load_at(path: &Path) -> Result<Self, ManifestError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let root = parse_yaml(&contents).map_err(|source| ManifestError::Parse {
            path: Some(path.to_path_buf()),
            source,
        })?;
        Self::from_manifest_value(root)
    }

    fn from_manifest_value(root: Value) -> Result<Self, ManifestError> {
        let mut root = match root {
            Value::Object(map) => map,
            // An empty file parses as null: nothing declared.
            Value::Null => return Ok(Self::default()),
            other => {
                return Err(ManifestError::InvalidSection {
                    section: "<root>",
                    found: kind_of(&other),
                })
            }
        };

        let mut decls = Self::default();
        for (name, fields) in section(&mut root, "connections")? {
            upsert(
                &mut decls.connections,
                ConnectionName::from(name),
                ConnectionDeclaration::from_value(fields),
            );
        }
        for (name, config) in section(&mut root, "models")? {
            upsert(&mut decls.models, ModelName::from(name), config);
        }
        Ok(decls)
    }
}

fn parse_yaml(yaml: &str) -> Result<Value, serde_yaml::Error> {
    if yaml.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_yaml::from_str(yaml)
}

fn section(root: &mut Map<String, Value>, key: &'static str) -> Result<Map<String, Value>, ManifestError> {
    match root.remove(key) {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(other) => Err(ManifestError::InvalidSection {
            section: key,
            found: kind_of(&other),
        }),
    }
}

fn upsert<K: PartialEq, V>(entries: &mut Vec<(K, V)>, key: K, value: V) {
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some(slot) => slot.1 = value,
        None => entries.push((key, value)),
    }
}

/// Human-readable JSON kind, for violation messages.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn manifest_preserves_declaration_order() {
        let decls = Declarations::from_yaml_str(
            "connections:\n  zeta: { adapter: a }\n  alpha: { adapter: b }\nmodels:\n  user: {}\n  post: {}\n",
        )
        .expect("parse");
        let conns: Vec<&str> = decls.connections.iter().map(|(n, _)| n.0.as_str()).collect();
        let models: Vec<&str> = decls.models.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(conns, ["zeta", "alpha"]);
        assert_eq!(models, ["user", "post"]);
    }

    #[test]
    fn missing_sections_are_empty() {
        let decls = Declarations::from_yaml_str("other: 1\n").expect("parse");
        assert!(decls.is_empty());
        assert!(decls.models.is_empty());

        let empty = Declarations::from_yaml_str("").expect("parse empty");
        assert!(empty.is_empty());
    }

    #[test]
    fn non_mapping_section_is_rejected() {
        let err = Declarations::from_yaml_str("connections: [a, b]\n").unwrap_err();
        assert!(matches!(
            err,
            ManifestError::InvalidSection { section: "connections", found: "sequence" }
        ));
    }

    #[test]
    fn builder_replaces_duplicate_names_in_place() {
        let decls = Declarations::new()
            .model("post", json!(1))
            .model("user", json!(2))
            .model("post", json!(3));
        assert_eq!(
            decls.models,
            vec![(ModelName::from("post"), json!(3)), (ModelName::from("user"), json!(2))]
        );
    }

    #[test]
    fn builder_writes_declaration_fields() {
        let decl = ConnectionDeclaration::new()
            .adapter_name("mongo")
            .config(json!({ "url": "mongodb://mongo" }))
            .default_connection(true)
            .models([ModelMatcher::exact("post"), ModelMatcher::pattern("^b").expect("regex")]);
        assert_eq!(
            decl.fields(),
            &json!({
                "adapter": "mongo",
                "config": { "url": "mongodb://mongo" },
                "default": true,
                "models": ["post", { "pattern": "^b" }],
            })
        );
    }
}
