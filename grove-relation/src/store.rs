//! One side's storage binding.

use grove_hooks::{MutationError, MutationResult};
use grove_model::{Model, ID_FIELD};
use grove_storage::{
    DataSource, Mutation, MutationFactory, MutationKind, Record, RequestContext, StorageError,
    Where,
};
use serde_json::Value;
use std::sync::Arc;

/// A model's data source together with its create translator.
#[derive(Clone)]
pub struct SideStore {
    model: String,
    source: Arc<dyn DataSource>,
    factory: MutationFactory,
    relation_fields: Vec<String>,
}

impl SideStore {
    pub fn new(model: &Model, source: Arc<dyn DataSource>) -> Self {
        Self {
            model: model.name().into(),
            source,
            factory: MutationFactory::for_model(model, MutationKind::Create),
            relation_fields: model.relation_fields().map(|f| f.name.clone()).collect(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn source(&self) -> &Arc<dyn DataSource> {
        &self.source
    }

    /// Translates a nested create payload. Relation keys inside it are not
    /// followed.
    pub(crate) fn create_mutation(&self, payload: &Record) -> MutationResult<Mutation> {
        if let Some(field) = self.relation_fields.iter().find(|f| payload.contains_key(*f)) {
            return Err(MutationError::InvalidPayload(format!(
                "nested create on {} cannot carry relation field '{field}'",
                self.model
            )));
        }
        Ok(self.factory.create_mutation(payload)?)
    }

    pub(crate) async fn create(
        &self,
        mutation: &Mutation,
        ctx: &RequestContext,
    ) -> MutationResult<Record> {
        Ok(self.source.create(mutation, ctx).await?)
    }

    /// Writes `key = value` on the record matching `filter`.
    pub(crate) async fn set_key(
        &self,
        filter: &Where,
        key: &str,
        value: Value,
        ctx: &RequestContext,
    ) -> MutationResult<()> {
        let mutation = Mutation::new().set(key, value);
        self.source.update(filter, &mutation, ctx).await?;
        Ok(())
    }

    /// Like [`set_key`](Self::set_key), but a filter matching nothing is not
    /// an error.
    pub(crate) async fn set_key_if_present(
        &self,
        filter: &Where,
        key: &str,
        value: Value,
        ctx: &RequestContext,
    ) -> MutationResult<()> {
        match self.set_key(filter, key, value, ctx).await {
            Err(MutationError::Storage(StorageError::NotFound(_))) => Ok(()),
            other => other,
        }
    }

    pub(crate) async fn delete(&self, filter: &Where, ctx: &RequestContext) -> MutationResult<()> {
        Ok(self.source.delete(filter, ctx).await?)
    }

    pub(crate) async fn find_by_id(
        &self,
        id: &str,
        ctx: &RequestContext,
    ) -> MutationResult<Option<Record>> {
        Ok(self.source.find_one(&Where::by_id(id), ctx).await?)
    }

    /// Identifiers of the records matching `filter`.
    pub(crate) async fn find_ids(
        &self,
        filter: &Where,
        ctx: &RequestContext,
    ) -> MutationResult<Vec<String>> {
        let records = self.source.find(filter, None, ctx).await?;
        Ok(records
            .iter()
            .filter_map(|r| record_id(r).ok())
            .map(String::from)
            .collect())
    }
}

pub(crate) fn record_id(record: &Record) -> MutationResult<&str> {
    record
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .ok_or_else(|| MutationError::InvalidPayload("record carries no string id".into()))
}

/// Identifiers held in a reference value, scalar or array.
pub(crate) fn held_ids(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(id)) => vec![id.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}
