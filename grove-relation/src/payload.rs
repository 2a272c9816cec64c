//! Nested relation payloads carried inside create/update data.

use grove_hooks::{MutationError, MutationResult};
use grove_storage::Record;
use serde_json::Value;

/// Payload of a to-one relation field: exactly one operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToOne {
    Create(Record),
    Connect(Record),
    Disconnect,
    Delete,
}

/// Payload of a to-many relation field. Groups are applied in declaration
/// order: connect, create, disconnect, delete.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToMany {
    pub connect: Vec<Record>,
    pub create: Vec<Record>,
    pub disconnect: Vec<Record>,
    pub delete: Vec<Record>,
}

impl ToMany {
    pub fn is_empty(&self) -> bool {
        self.connect.is_empty()
            && self.create.is_empty()
            && self.disconnect.is_empty()
            && self.delete.is_empty()
    }
}

fn object<'v>(field: &str, key: &str, value: &'v Value) -> MutationResult<&'v Record> {
    value.as_object().ok_or_else(|| {
        MutationError::InvalidPayload(format!("'{field}.{key}' must be an object"))
    })
}

fn objects(field: &str, key: &str, value: &Value) -> MutationResult<Vec<Record>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(single) => Ok(vec![single.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| object(field, key, item).cloned())
            .collect(),
        _ => Err(MutationError::InvalidPayload(format!(
            "'{field}.{key}' must be an object or a list of objects"
        ))),
    }
}

fn flag(field: &str, key: &str, value: &Value) -> MutationResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Null => Ok(false),
        _ => Err(MutationError::InvalidPayload(format!(
            "'{field}.{key}' takes true or false"
        ))),
    }
}

fn operations<'v>(field: &str, value: &'v Value) -> MutationResult<Option<&'v Record>> {
    match value {
        Value::Null => Ok(None),
        Value::Object(ops) => Ok(Some(ops)),
        _ => Err(MutationError::InvalidPayload(format!(
            "relation field '{field}' takes an operation object"
        ))),
    }
}

/// Parses a to-one payload. `None` means nothing to do: the value was null or
/// a `false` flag.
pub fn parse_to_one(field: &str, value: &Value) -> MutationResult<Option<ToOne>> {
    let Some(ops) = operations(field, value)? else {
        return Ok(None);
    };
    let mut entries = ops.iter();
    let (key, arg) = match (entries.next(), entries.next()) {
        (Some(entry), None) => entry,
        _ => {
            return Err(MutationError::InvalidPayload(format!(
                "to-one field '{field}' takes exactly one of create, connect, disconnect, delete"
            )));
        }
    };
    let op = match key.as_str() {
        "create" => Some(ToOne::Create(object(field, key, arg)?.clone())),
        "connect" => Some(ToOne::Connect(object(field, key, arg)?.clone())),
        "disconnect" => flag(field, key, arg)?.then_some(ToOne::Disconnect),
        "delete" => flag(field, key, arg)?.then_some(ToOne::Delete),
        other => {
            return Err(MutationError::InvalidPayload(format!(
                "unknown operation '{other}' on '{field}'"
            )));
        }
    };
    Ok(op)
}

/// Parses a to-many payload. A single object is accepted where a list is
/// expected.
pub fn parse_to_many(field: &str, value: &Value) -> MutationResult<ToMany> {
    let mut payload = ToMany::default();
    let Some(ops) = operations(field, value)? else {
        return Ok(payload);
    };
    for (key, arg) in ops {
        let slot = match key.as_str() {
            "connect" => &mut payload.connect,
            "create" => &mut payload.create,
            "disconnect" => &mut payload.disconnect,
            "delete" => &mut payload.delete,
            other => {
                return Err(MutationError::InvalidPayload(format!(
                    "unknown operation '{other}' on '{field}'"
                )));
            }
        };
        *slot = objects(field, key, arg)?;
    }
    Ok(payload)
}
