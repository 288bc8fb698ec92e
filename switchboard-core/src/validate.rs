//! Capability validation for connection declarations.
//!
//! Two steps, both pure:
//! - [`check_shape`] inspects the declaration itself and needs no adapters.
//! - [`ConnectionShape::bind`] resolves the adapter against a catalog and
//!   probes the optional refine capability, once.
//!
//! Required adapter operations are guaranteed by the [`Adapter`] trait, so the
//! remaining checks are structural. Unknown fields are ignored.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::adapter::{Adapter, AdapterCatalog, RefineModels};
use crate::declaration::{kind_of, ConnectionDeclaration};
use crate::error::{ValidationError, Violation};
use crate::types::{Config, ConnectionName, ModelMatcher, Route};

/// Where a declaration's adapter comes from.
#[derive(Clone)]
pub enum AdapterSource {
    Instance(Arc<dyn Adapter>),
    Named(String),
}

impl fmt::Debug for AdapterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterSource::Instance(_) => f.write_str("Instance(..)"),
            AdapterSource::Named(name) => f.debug_tuple("Named").field(name).finish(),
        }
    }
}

/// A declaration that passed the structural checks.
#[derive(Debug, Clone)]
pub struct ConnectionShape {
    pub name: ConnectionName,
    pub adapter: AdapterSource,
    pub config: Config,
    pub route: Route,
}

/// A declaration whose adapter has been bound and probed.
#[derive(Clone)]
pub struct ValidatedConnection {
    pub name: ConnectionName,
    pub adapter: Arc<dyn Adapter>,
    pub refiner: Option<Arc<dyn RefineModels>>,
    pub config: Config,
    pub route: Route,
}

impl fmt::Debug for ValidatedConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedConnection")
            .field("name", &self.name)
            .field("refines", &self.refiner.is_some())
            .field("config", &self.config)
            .field("route", &self.route)
            .finish()
    }
}

/// Validate a declaration end to end: shape first, then adapter binding.
pub fn validate_connection(
    name: &ConnectionName,
    decl: &ConnectionDeclaration,
    catalog: &AdapterCatalog,
) -> Result<ValidatedConnection, ValidationError> {
    check_shape(name, decl)?.bind(catalog)
}

/// Check the structure of a declaration, stopping at the first violation.
pub fn check_shape(
    name: &ConnectionName,
    decl: &ConnectionDeclaration,
) -> Result<ConnectionShape, ValidationError> {
    let fail = |violation| ValidationError::new(name.clone(), violation);

    let fields = match &decl.fields {
        Value::Object(map) => map,
        other => return Err(fail(Violation::NotAMapping { found: kind_of(other) })),
    };

    let adapter = adapter_source(decl, fields).map_err(fail)?;
    let config = config_of(decl, fields).map_err(fail)?;

    let is_default = match fields.get("default") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(other) => return Err(fail(Violation::InvalidDefault { found: kind_of(other) })),
    };

    let matchers = match fields.get("models") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => matchers_of(items).map_err(fail)?,
        Some(other) => return Err(fail(Violation::InvalidMatchers { found: kind_of(other) })),
    };

    Ok(ConnectionShape {
        name: name.clone(),
        adapter,
        config,
        route: Route { is_default, matchers },
    })
}

impl ConnectionShape {
    /// Resolve the adapter and probe its refine capability.
    pub fn bind(self, catalog: &AdapterCatalog) -> Result<ValidatedConnection, ValidationError> {
        let adapter = match self.adapter {
            AdapterSource::Instance(adapter) => adapter,
            AdapterSource::Named(adapter_name) => match catalog.get(&adapter_name) {
                Some(adapter) => adapter,
                None => {
                    return Err(ValidationError::new(
                        self.name,
                        Violation::UnknownAdapter { name: adapter_name },
                    ))
                }
            },
        };
        let refiner = Arc::clone(&adapter).refiner();
        Ok(ValidatedConnection {
            name: self.name,
            adapter,
            refiner,
            config: self.config,
            route: self.route,
        })
    }
}

fn adapter_source(decl: &ConnectionDeclaration, fields: &Map<String, Value>) -> Result<AdapterSource, Violation> {
    if let Some(adapter) = &decl.adapter {
        return Ok(AdapterSource::Instance(Arc::clone(adapter)));
    }
    match fields.get("adapter") {
        None | Some(Value::Null) => Err(Violation::MissingAdapter),
        Some(Value::String(s)) if s.trim().is_empty() => Err(Violation::MissingAdapter),
        Some(Value::String(s)) => Ok(AdapterSource::Named(s.clone())),
        Some(other) => Err(Violation::AdapterNotAName { found: kind_of(other) }),
    }
}

fn config_of(decl: &ConnectionDeclaration, fields: &Map<String, Value>) -> Result<Config, Violation> {
    if let Some(factory) = &decl.config_factory {
        return Ok(Config::Factory(Arc::clone(factory)));
    }
    match fields.get("config") {
        None => Ok(Config::default()),
        Some(value @ (Value::Null | Value::Object(_))) => Ok(Config::Literal(value.clone())),
        Some(other) => Err(Violation::InvalidConfig { found: kind_of(other) }),
    }
}

fn matchers_of(items: &[Value]) -> Result<Vec<ModelMatcher>, Violation> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::String(name) => Ok(ModelMatcher::Exact(name.clone())),
            Value::Object(map) => match map.get("pattern") {
                Some(Value::String(pattern)) => ModelMatcher::pattern(pattern)
                    .map_err(|source| Violation::InvalidPattern { index, source }),
                _ => Err(Violation::InvalidMatcher { index, found: "mapping without `pattern`" }),
            },
            other => Err(Violation::InvalidMatcher { index, found: kind_of(other) }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn name() -> ConnectionName {
        ConnectionName::from("mongo")
    }

    #[test]
    fn minimal_declaration_defaults() {
        let decl = ConnectionDeclaration::new().adapter_name("mongo");
        let shape = check_shape(&name(), &decl).expect("valid");
        assert!(matches!(shape.adapter, AdapterSource::Named(ref n) if n == "mongo"));
        assert!(!shape.route.is_default);
        assert!(shape.route.matchers.is_empty());
        assert!(matches!(shape.config, Config::Literal(Value::Null)));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let decl = ConnectionDeclaration::from_value(json!({
            "adapter": "mongo",
            "poolSize": 10,
            "tags": ["primary"],
        }));
        assert!(check_shape(&name(), &decl).is_ok());
    }

    #[test]
    fn matchers_keep_declared_order() {
        let decl = ConnectionDeclaration::from_value(json!({
            "adapter": "mongo",
            "models": ["post", { "pattern": "^b" }, "user"],
        }));
        let shape = check_shape(&name(), &decl).expect("valid");
        let rendered: Vec<String> = shape.route.matchers.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["\"post\"", "/^b/", "\"user\""]);
    }

    #[test]
    fn factory_wins_over_config_field() {
        let decl = ConnectionDeclaration::new()
            .adapter_name("mongo")
            .config(json!({ "a": 1 }))
            .config_factory(|| json!({ "b": 2 }));
        let shape = check_shape(&name(), &decl).expect("valid");
        assert_eq!(shape.config.resolve(), json!({ "b": 2 }));
    }

    #[test]
    fn unknown_catalog_name_fails_binding() {
        let decl = ConnectionDeclaration::new().adapter_name("redis");
        let err = validate_connection(&name(), &decl, &AdapterCatalog::new()).unwrap_err();
        assert_eq!(err.connection, name());
        assert!(matches!(err.violation, Violation::UnknownAdapter { ref name } if name == "redis"));
    }
}
