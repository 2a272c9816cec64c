//! Storage-layer mutation values and the payload translator that builds them.

use crate::error::{StorageError, StorageResult};
use crate::Record;
use grove_model::{FieldKind, Model};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

/// One write to one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldUpdate {
    /// Overwrite the field.
    Set(Value),
    /// Append values to an array field. Existing elements are not deduplicated.
    Add(Vec<Value>),
    /// Remove every element equal to one of the values.
    Remove(Vec<Value>),
}

/// An ordered list of field writes for one record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Mutation {
    updates: Vec<(String, FieldUpdate)>,
}

impl Mutation {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn set(mut self, field: &str, value: Value) -> Self {
        self.push(field, FieldUpdate::Set(value));
        self
    }

    #[must_use]
    pub fn add(mut self, field: &str, values: Vec<Value>) -> Self {
        self.push(field, FieldUpdate::Add(values));
        self
    }

    #[must_use]
    pub fn remove(mut self, field: &str, values: Vec<Value>) -> Self {
        self.push(field, FieldUpdate::Remove(values));
        self
    }

    pub fn push(&mut self, field: &str, update: FieldUpdate) {
        self.updates.push((field.into(), update));
    }

    pub fn updates(&self) -> &[(String, FieldUpdate)] {
        &self.updates
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Applies the writes to a record in order.
    ///
    /// Array operations on a missing or null field start from an empty array;
    /// on a non-array value they fail.
    pub fn apply(&self, record: &mut Record) -> StorageResult<()> {
        for (field, update) in &self.updates {
            match update {
                FieldUpdate::Set(value) => {
                    record.insert(field.clone(), value.clone());
                }
                FieldUpdate::Add(values) => {
                    array_entry(record, field)?.extend(values.iter().cloned());
                }
                FieldUpdate::Remove(values) => {
                    array_entry(record, field)?.retain(|v| !values.contains(v));
                }
            }
        }
        Ok(())
    }
}

fn array_entry<'a>(record: &'a mut Record, field: &str) -> StorageResult<&'a mut Vec<Value>> {
    let entry = record
        .entry(field.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if entry.is_null() {
        *entry = Value::Array(Vec::new());
    }
    entry
        .as_array_mut()
        .ok_or_else(|| StorageError::InvalidData(format!("field '{field}' is not an array")))
}

/// Which mutation entry point a factory serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
}

/// Translates a raw payload into a [`Mutation`] for one model and operation.
///
/// Fields marked as arrays accept `{set, add, remove}` sub-objects; those are
/// turned into native array operations rather than a full overwrite.
#[derive(Debug, Clone)]
pub struct MutationFactory {
    kind: MutationKind,
    array_fields: HashSet<String>,
}

impl MutationFactory {
    pub fn new(kind: MutationKind) -> Self {
        Self {
            kind,
            array_fields: HashSet::new(),
        }
    }

    /// A factory with every scalar-list and object-list field of `model` marked.
    pub fn for_model(model: &Model, kind: MutationKind) -> Self {
        let mut factory = Self::new(kind);
        for field in model.fields() {
            if field.list && !matches!(field.kind, FieldKind::Relation(_)) {
                factory.mark_array_field(&field.name);
            }
        }
        factory
    }

    pub fn mark_array_field(&mut self, name: &str) {
        self.array_fields.insert(name.into());
    }

    pub fn is_array_field(&self, name: &str) -> bool {
        self.array_fields.contains(name)
    }

    pub fn create_mutation(&self, payload: &Record) -> StorageResult<Mutation> {
        let mut mutation = Mutation::new();
        for (name, value) in payload {
            match value {
                Value::Object(ops) if self.is_array_field(name) => {
                    self.push_array_ops(&mut mutation, name, ops)?;
                }
                _ => mutation.push(name, FieldUpdate::Set(value.clone())),
            }
        }
        Ok(mutation)
    }

    fn push_array_ops(
        &self,
        mutation: &mut Mutation,
        name: &str,
        ops: &Record,
    ) -> StorageResult<()> {
        if let Some(key) = ops.keys().find(|k| !matches!(k.as_str(), "set" | "add" | "remove")) {
            return Err(StorageError::InvalidData(format!(
                "unknown list operation '{key}' on field '{name}'"
            )));
        }
        let set = list_values(ops, "set", name)?;
        let add = list_values(ops, "add", name)?;
        let remove = list_values(ops, "remove", name)?;

        match self.kind {
            MutationKind::Create => {
                if remove.is_some() {
                    return Err(StorageError::InvalidData(format!(
                        "cannot remove from list field '{name}' on create"
                    )));
                }
                let mut values = set.unwrap_or_default();
                values.extend(add.unwrap_or_default());
                mutation.push(name, FieldUpdate::Set(Value::Array(values)));
            }
            MutationKind::Update => {
                if let Some(values) = set {
                    mutation.push(name, FieldUpdate::Set(Value::Array(values)));
                }
                if let Some(values) = add {
                    mutation.push(name, FieldUpdate::Add(values));
                }
                if let Some(values) = remove {
                    mutation.push(name, FieldUpdate::Remove(values));
                }
            }
        }
        Ok(())
    }
}

fn list_values(ops: &Record, key: &str, field: &str) -> StorageResult<Option<Vec<Value>>> {
    match ops.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(values)) => Ok(Some(values.clone())),
        Some(_) => Err(StorageError::InvalidData(format!(
            "'{key}' on list field '{field}' must be an array"
        ))),
    }
}
