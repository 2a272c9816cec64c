//! Schema compilation and entry points for grove.
//!
//! [`Engine::builder`] takes a compiled [`Schema`](grove_model::Schema),
//! binds every model to a data source, builds one relation engine per
//! relation and merges the relation hooks with extension hooks into one
//! chain per model. The resulting [`Engine`] serves create/update/delete,
//! find and field resolution for the rest of the process.
//!
//! ```ignore
//! let engine = Engine::builder(schema)
//!     .data_sources(MemoryStore::new())
//!     .extension(audit_hooks)
//!     .build()?;
//! let user = engine.create("User", data, RequestContext::new()).await?;
//! ```

mod config;
mod engine;
mod error;
mod global;
mod stamp;

pub use config::EngineConfig;
pub use engine::{Engine, EngineBuilder};
pub use error::{EngineError, EngineResult};
pub use global::{global, install};
