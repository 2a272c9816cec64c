//! In-memory reference driver.
//!
//! Every model maps to one named collection of JSON records behind a shared
//! `RwLock`. Relation filters are evaluated against sibling collections in
//! the same store, so one `MemoryStore` should back a whole schema.

mod eval;

use crate::error::{StorageError, StorageResult};
use crate::filter::{Pagination, Where};
use crate::mutation::Mutation;
use crate::source::{
    DataSource, DataSourceFactory, ListMutable, ListReadable, MapMutable, MapReadable, Record,
    RelationMutable, RequestContext,
};
use async_trait::async_trait;
use eval::Collections;
use grove_model::{Model, ID_FIELD};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Shared handle to a set of in-memory collections. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A data source bound to collection `name`.
    pub fn collection(&self, name: &str) -> MemoryCollection {
        MemoryCollection {
            name: name.into(),
            store: self.clone(),
        }
    }

    /// Snapshot of every record in a collection.
    pub async fn records(&self, name: &str) -> Vec<Record> {
        self.collections
            .read()
            .await
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Seeds a record as-is, bypassing mutation handling.
    pub async fn insert(&self, name: &str, record: Record) {
        self.collections
            .write()
            .await
            .entry(name.into())
            .or_default()
            .push(record);
    }

    /// Looks up one record by identifier.
    pub async fn get(&self, name: &str, id: &str) -> Option<Record> {
        self.collections
            .read()
            .await
            .get(name)?
            .iter()
            .find(|r| record_id(r) == Some(id))
            .cloned()
    }
}

impl DataSourceFactory for MemoryStore {
    fn data_source(&self, model: &Model) -> Arc<dyn DataSource> {
        Arc::new(self.collection(model.storage_key()))
    }
}

fn record_id(record: &Record) -> Option<&str> {
    record.get(ID_FIELD).and_then(Value::as_str)
}

/// One collection of a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryCollection {
    name: String,
    store: MemoryStore,
}

impl MemoryCollection {
    pub fn name(&self) -> &str {
        &self.name
    }

    async fn modify_reference(
        &self,
        id: &str,
        field: &str,
        apply: impl FnOnce(&mut Vec<Value>),
    ) -> StorageResult<()> {
        let mut db = self.store.collections.write().await;
        let record = db
            .get_mut(&self.name)
            .and_then(|rows| rows.iter_mut().find(|r| record_id(r) == Some(id)))
            .ok_or_else(|| StorageError::NotFound(format!("{}/{id}", self.name)))?;

        let entry = record
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if entry.is_null() {
            *entry = Value::Array(Vec::new());
        }
        let Value::Array(items) = entry else {
            return Err(StorageError::InvalidData(format!(
                "reference field '{field}' on {}/{id} is not an array",
                self.name
            )));
        };
        apply(items);
        Ok(())
    }
}

#[async_trait]
impl ListReadable for MemoryCollection {
    async fn find(
        &self,
        filter: &Where,
        pagination: Option<&Pagination>,
        _ctx: &RequestContext,
    ) -> StorageResult<Vec<Record>> {
        let db = self.store.collections.read().await;
        let rows = db.get(&self.name).map(Vec::as_slice).unwrap_or_default();
        let hits = rows
            .iter()
            .filter(|r| eval::matches(&db, r, filter))
            .cloned()
            .collect();
        Ok(eval::paginate(hits, pagination))
    }

    async fn find_one(
        &self,
        filter: &Where,
        _ctx: &RequestContext,
    ) -> StorageResult<Option<Record>> {
        let db = self.store.collections.read().await;
        let rows = db.get(&self.name).map(Vec::as_slice).unwrap_or_default();
        Ok(rows.iter().find(|r| eval::matches(&db, r, filter)).cloned())
    }
}

#[async_trait]
impl ListMutable for MemoryCollection {
    async fn create(&self, mutation: &Mutation, _ctx: &RequestContext) -> StorageResult<Record> {
        let mut record = Record::new();
        mutation.apply(&mut record)?;
        if record_id(&record).is_none() {
            record.insert(ID_FIELD.into(), Value::String(Uuid::now_v7().to_string()));
        }

        let mut db = self.store.collections.write().await;
        db.entry(self.name.clone()).or_default().push(record.clone());
        debug!(collection = %self.name, id = ?record_id(&record), "created record");
        Ok(record)
    }

    async fn update(
        &self,
        filter: &Where,
        mutation: &Mutation,
        _ctx: &RequestContext,
    ) -> StorageResult<Record> {
        let mut db = self.store.collections.write().await;
        let position = db
            .get(&self.name)
            .and_then(|rows| rows.iter().position(|r| eval::matches(&db, r, filter)));
        let not_found = || StorageError::NotFound(format!("{} where {filter}", self.name));
        let index = position.ok_or_else(not_found)?;
        let slot = db
            .get_mut(&self.name)
            .and_then(|rows| rows.get_mut(index))
            .ok_or_else(not_found)?;

        let mut updated = slot.clone();
        mutation.apply(&mut updated)?;
        *slot = updated.clone();
        debug!(collection = %self.name, id = ?record_id(&updated), "updated record");
        Ok(updated)
    }

    async fn delete(&self, filter: &Where, _ctx: &RequestContext) -> StorageResult<()> {
        let mut db = self.store.collections.write().await;
        let doomed: Vec<bool> = db
            .get(&self.name)
            .map(|rows| rows.iter().map(|r| eval::matches(&db, r, filter)).collect())
            .unwrap_or_default();
        let count = doomed.iter().filter(|d| **d).count();
        if count == 0 {
            return Err(StorageError::NotFound(format!(
                "{} where {filter}",
                self.name
            )));
        }
        if let Some(rows) = db.get_mut(&self.name) {
            let mut flags = doomed.into_iter();
            rows.retain(|_| !flags.next().unwrap_or(false));
        }
        debug!(collection = %self.name, count, "deleted records");
        Ok(())
    }
}

#[async_trait]
impl MapReadable for MemoryCollection {
    async fn get_map(&self, _ctx: &RequestContext) -> StorageResult<Record> {
        let db = self.store.collections.read().await;
        Ok(db
            .get(&self.name)
            .and_then(|rows| rows.first())
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl MapMutable for MemoryCollection {
    async fn update_map(&self, mutation: &Mutation, _ctx: &RequestContext) -> StorageResult<()> {
        let mut db = self.store.collections.write().await;
        let rows = db.entry(self.name.clone()).or_default();
        if rows.is_empty() {
            rows.push(Record::new());
        }
        if let Some(map) = rows.first_mut() {
            let mut updated = map.clone();
            mutation.apply(&mut updated)?;
            *map = updated;
        }
        Ok(())
    }
}

#[async_trait]
impl RelationMutable for MemoryCollection {
    async fn add_reference(
        &self,
        id: &str,
        field: &str,
        reference: &str,
        _ctx: &RequestContext,
    ) -> StorageResult<()> {
        self.modify_reference(id, field, |items| {
            items.push(Value::String(reference.into()));
        })
        .await?;
        debug!(collection = %self.name, id, field, reference, "added reference");
        Ok(())
    }

    async fn remove_reference(
        &self,
        id: &str,
        field: &str,
        reference: &str,
        _ctx: &RequestContext,
    ) -> StorageResult<()> {
        self.modify_reference(id, field, |items| {
            items.retain(|item| item.as_str() != Some(reference));
        })
        .await?;
        debug!(collection = %self.name, id, field, reference, "removed reference");
        Ok(())
    }
}
