//! Domain types shared by the validator, the resolver and the runtime.
//!
//! Handles and realized models are type-erased: every adapter owns its own
//! client and model types, and callers downcast to them after wiring.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for a declared connection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionName(pub String);

impl fmt::Display for ConnectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ConnectionName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ConnectionName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A strongly-typed name for a declared model.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModelName(pub String);

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ModelName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ModelName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl ModelName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Zero-argument producer of a connection config.
pub type ConfigFactory = Arc<dyn Fn() -> Value + Send + Sync>;

/// A connection config: either a plain value or a factory evaluated once when
/// the connection is initialized.
#[derive(Clone)]
pub enum Config {
    Literal(Value),
    Factory(ConfigFactory),
}

impl Config {
    /// Produce the config value, invoking the factory if there is one.
    pub fn resolve(self) -> Value {
        match self {
            Config::Literal(value) => value,
            Config::Factory(factory) => factory(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::Literal(Value::Null)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Config::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Config::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Matchers and routes
// ---------------------------------------------------------------------------

/// One entry of a connection's `models` list.
#[derive(Debug, Clone)]
pub enum ModelMatcher {
    /// Matches a model whose name is exactly this string.
    Exact(String),
    /// Matches a model whose name contains a match for this pattern.
    Pattern(Regex),
}

impl ModelMatcher {
    pub fn exact(name: impl Into<String>) -> Self {
        ModelMatcher::Exact(name.into())
    }

    /// Compile `pattern` into a matcher.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(ModelMatcher::Pattern)
    }

    pub fn matches(&self, model: &str) -> bool {
        match self {
            ModelMatcher::Exact(name) => name == model,
            ModelMatcher::Pattern(re) => re.is_match(model),
        }
    }

    /// The declaration form of this matcher: a bare string or `{ pattern }`.
    pub fn to_value(&self) -> Value {
        match self {
            ModelMatcher::Exact(name) => Value::String(name.clone()),
            ModelMatcher::Pattern(re) => json!({ "pattern": re.as_str() }),
        }
    }
}

impl fmt::Display for ModelMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelMatcher::Exact(name) => write!(f, "{name:?}"),
            ModelMatcher::Pattern(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

/// The part of a connection that decides which models it owns.
#[derive(Debug, Clone, Default)]
pub struct Route {
    pub is_default: bool,
    pub matchers: Vec<ModelMatcher>,
}

impl AsRef<Route> for Route {
    fn as_ref(&self) -> &Route {
        self
    }
}

// ---------------------------------------------------------------------------
// Type-erased adapter values
// ---------------------------------------------------------------------------

/// A live connection handle produced by an adapter's connect hook.
#[derive(Clone)]
pub struct Handle(Arc<dyn Any + Send + Sync>);

impl Handle {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    /// Clone out the shared value as an `Arc<T>` if it holds a `T`.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.0).downcast().ok()
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handle(..)")
    }
}

/// A model after an adapter realized (or refined) it.
#[derive(Clone)]
pub struct RealizedModel(Arc<dyn Any + Send + Sync>);

impl RealizedModel {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.0).downcast().ok()
    }

    /// True when both values point at the same allocation.
    pub fn ptr_eq(&self, other: &RealizedModel) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for RealizedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RealizedModel(..)")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
