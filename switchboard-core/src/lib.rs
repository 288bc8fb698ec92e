//! Switchboard core library: domain types, the adapter contract, declarations,
//! capability validation and model resolution.
//!
//! - [`types`]: newtypes, configs, matchers, type-erased handles
//! - [`adapter`]: [`Adapter`], [`RefineModels`], [`AdapterCatalog`]
//! - [`declaration`]: [`Declarations`] and YAML manifest loading
//! - [`validate`]: the capability validator
//! - [`resolve`]: pure model → connection resolution
//! - [`error`]: [`ValidationError`], [`ManifestError`]

pub mod adapter;
pub mod declaration;
pub mod error;
pub mod resolve;
pub mod types;
pub mod validate;

pub use adapter::{Adapter, AdapterCatalog, BoxError, ModelSet, RefineModels};
pub use declaration::{ConnectionDeclaration, Declarations};
pub use error::{ManifestError, ValidationError, Violation};
pub use resolve::{find_owner, Resolution, ResolutionRule};
pub use types::{Config, ConnectionName, Handle, ModelMatcher, ModelName, RealizedModel, Route};
pub use validate::{
    check_shape, validate_connection, AdapterSource, ConnectionShape, ValidatedConnection,
};
