//! Storage abstraction for grove.
//!
//! The core never talks to a database directly. It speaks to collections
//! through capability traits:
//! - [`ListReadable`] / [`ListMutable`]: filtered collection reads and writes
//! - [`MapReadable`] / [`MapMutable`]: singleton object-type models
//! - [`RelationMutable`]: single-record reference array primitives
//!
//! Filters arrive as a compiled [`Where`] tree and writes as a [`Mutation`].
//! [`MemoryStore`] is the in-memory reference driver.

mod error;
mod filter;
mod memory;
mod mutation;
mod source;

pub use error::{StorageError, StorageResult};
pub use filter::{
    Comparison, Condition, ElementFilter, ListQuantifier, Operator, Pagination, RelationWhere,
    RelationWhereConfig, Where,
};
pub use memory::{MemoryCollection, MemoryStore};
pub use mutation::{FieldUpdate, Mutation, MutationFactory, MutationKind};
pub use source::{
    DataSource, DataSourceFactory, ListMutable, ListReadable, MapMutable, MapReadable, Record,
    RelationMutable, RequestContext,
};
