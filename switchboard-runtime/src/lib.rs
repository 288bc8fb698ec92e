//! Switchboard runtime: the startup wiring pipeline.
//!
//! [`Pipeline::run`] validates and opens every declared connection, resolves
//! and realizes every declared model against its owning connection, then lets
//! adapters refine their models as a batch. Each stage fans out over tokio
//! tasks and fully settles before the next begins.

mod connections;
mod error;
mod models;
pub mod pipeline;
mod refine;
pub mod registry;
pub mod sink;
mod task_group;

pub use error::PipelineError;
pub use pipeline::{run, Pipeline, Stage};
pub use registry::{ConnectionRecord, ConnectionRegistry, ModelEntry, ModelRegistry, Wiring};
pub use sink::{init_tracing, DiagnosticSink, TracingSink};
