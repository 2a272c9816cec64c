use chrono::{SecondsFormat, Utc};
use grove_model::{DataModelType, Model};
use grove_storage::Record;
use serde_json::Value;

/// Names of the fields stamped with the write time.
pub(crate) fn stamped_fields(model: &Model) -> Vec<String> {
    model
        .fields()
        .iter()
        .filter(|f| f.updated_at && f.is_scalar() && f.data_type() == DataModelType::DateTime)
        .map(|f| f.name.clone())
        .collect()
}

/// Overwrites every stamped field with the current UTC time (RFC 3339).
pub(crate) fn stamp(data: &mut Record, fields: &[String]) {
    if fields.is_empty() {
        return;
    }
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    for field in fields {
        data.insert(field.clone(), Value::String(now.clone()));
    }
}
