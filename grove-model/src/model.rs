use crate::field::Field;
use serde::{Deserialize, Serialize};

/// Naming conventions derived from a model name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namings {
    pub singular: String,
    pub plural: String,
    pub capital_singular: String,
    pub capital_plural: String,
}

impl Namings {
    pub fn from_name(name: &str) -> Self {
        let capital_singular = upper_first(name);
        let capital_plural = pluralize(&capital_singular);
        Self {
            singular: lower_first(&capital_singular),
            plural: lower_first(&capital_plural),
            capital_singular,
            capital_plural,
        }
    }
}

/// A named entity type backed by one storage collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    name: String,
    namings: Namings,
    fields: Vec<Field>,
    /// Storage binding key; the model name is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_key: Option<String>,
    /// Object-type models are singletons served through the map capability.
    #[serde(default)]
    object_type: bool,
}

impl Model {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            namings: Namings::from_name(name),
            fields: Vec::new(),
            source_key: None,
            object_type: false,
        }
    }

    #[must_use]
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    #[must_use]
    pub fn with_source_key(mut self, key: &str) -> Self {
        self.source_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn object_type(mut self) -> Self {
        self.object_type = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namings(&self) -> &Namings {
        &self.namings
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub(crate) fn fields_mut(&mut self) -> &mut [Field] {
        &mut self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn source_key(&self) -> Option<&str> {
        self.source_key.as_deref()
    }

    /// Collection name the storage layer knows this model by.
    pub fn storage_key(&self) -> &str {
        self.source_key.as_deref().unwrap_or(&self.name)
    }

    pub fn is_object_type(&self) -> bool {
        self.object_type
    }

    pub fn unique_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.unique)
    }

    pub fn relation_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_relation())
    }
}

pub fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// English plural for identifier-style words.
fn pluralize(word: &str) -> String {
    let lower = word.to_lowercase();
    if lower.ends_with('s')
        || lower.ends_with('x')
        || lower.ends_with('z')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
    {
        return format!("{word}es");
    }
    if let Some(stem) = word.strip_suffix('y') {
        let before = stem.chars().last().map(|c| c.to_ascii_lowercase());
        if !matches!(before, Some('a' | 'e' | 'i' | 'o' | 'u') | None) {
            return format!("{stem}ies");
        }
    }
    format!("{word}s")
}
