//! Capability traits every storage driver implements.

use crate::error::StorageResult;
use crate::filter::{Pagination, Where};
use crate::mutation::Mutation;
use async_trait::async_trait;
use grove_model::Model;
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

/// A stored record: a JSON object carrying at least an `id`.
pub type Record = Map<String, Value>;

/// Per-request context handed through to every storage call.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: Uuid,
    /// Caller-supplied attributes (auth claims, tenant, ...).
    pub attributes: Map<String, Value>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            attributes: Map::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, key: &str, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Collection-level reads.
#[async_trait]
pub trait ListReadable: Send + Sync {
    async fn find(
        &self,
        filter: &Where,
        pagination: Option<&Pagination>,
        ctx: &RequestContext,
    ) -> StorageResult<Vec<Record>>;

    async fn find_one(&self, filter: &Where, ctx: &RequestContext)
    -> StorageResult<Option<Record>>;
}

/// Collection-level writes.
#[async_trait]
pub trait ListMutable: Send + Sync {
    /// Inserts a record, assigning an `id` when the mutation does not set one.
    async fn create(&self, mutation: &Mutation, ctx: &RequestContext) -> StorageResult<Record>;

    /// Applies `mutation` to the first record matching `filter`.
    ///
    /// Fails with `NotFound` when nothing matches.
    async fn update(
        &self,
        filter: &Where,
        mutation: &Mutation,
        ctx: &RequestContext,
    ) -> StorageResult<Record>;

    /// Removes every record matching `filter`; fails with `NotFound` when
    /// nothing matches.
    async fn delete(&self, filter: &Where, ctx: &RequestContext) -> StorageResult<()>;
}

/// Record-level read of a singleton object-type model.
#[async_trait]
pub trait MapReadable: Send + Sync {
    async fn get_map(&self, ctx: &RequestContext) -> StorageResult<Record>;
}

/// Record-level write of a singleton object-type model.
#[async_trait]
pub trait MapMutable: Send + Sync {
    async fn update_map(&self, mutation: &Mutation, ctx: &RequestContext) -> StorageResult<()>;
}

/// Array-reference primitives used by many-to-many links. Each call touches
/// exactly one record.
#[async_trait]
pub trait RelationMutable: Send + Sync {
    async fn add_reference(
        &self,
        id: &str,
        field: &str,
        reference: &str,
        ctx: &RequestContext,
    ) -> StorageResult<()>;

    async fn remove_reference(
        &self,
        id: &str,
        field: &str,
        reference: &str,
        ctx: &RequestContext,
    ) -> StorageResult<()>;
}

/// A driver bound to one model's collection, exposing every capability.
pub trait DataSource:
    ListReadable + ListMutable + MapReadable + MapMutable + RelationMutable
{
}

impl<T> DataSource for T where
    T: ListReadable + ListMutable + MapReadable + MapMutable + RelationMutable
{
}

/// Binds models to their data sources at schema-compile time.
pub trait DataSourceFactory: Send + Sync {
    fn data_source(&self, model: &Model) -> Arc<dyn DataSource>;
}
