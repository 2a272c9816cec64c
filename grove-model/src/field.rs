use crate::relation::RelationType;
use serde::{Deserialize, Serialize};

/// Name of the identifier field every stored record carries.
pub const ID_FIELD: &str = "id";

/// The data type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataModelType {
    Id,
    String,
    Int,
    Float,
    Boolean,
    DateTime,
    Json,
    Email,
    Url,
    Enum,
    CustomScalar,
    Object,
    Relation,
}

impl DataModelType {
    /// Default type name used when a field is built without an explicit one.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::String => "String",
            Self::Int => "Int",
            Self::Float => "Float",
            Self::Boolean => "Boolean",
            Self::DateTime => "DateTime",
            Self::Json => "JSON",
            Self::Email => "Email",
            Self::Url => "Url",
            Self::Enum => "Enum",
            Self::CustomScalar => "Scalar",
            Self::Object => "Object",
            Self::Relation => "Relation",
        }
    }
}

/// Which side of a relation stores the foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyHolder {
    /// Records of the model declaring this field hold the key.
    Local,
    /// Records of the target model hold the key.
    Remote,
}

/// Side-specific relation metadata.
///
/// `foreign_key` and `holder` may be left empty in descriptors; schema
/// compilation fills both in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder: Option<KeyHolder>,
    /// Marks the owning side of a bidirectional one-to-one relation.
    #[serde(default)]
    pub owner: bool,
}

/// Relation-specific part of a field descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationField {
    /// Name of the target model.
    pub target: String,
    /// Pairs both fields of a bidirectional relation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_name: Option<String>,
    pub relation_type: RelationType,
    #[serde(default)]
    pub metadata: RelationMetadata,
}

impl RelationField {
    /// Resolved foreign-key name (an empty string before schema compilation).
    pub fn foreign_key(&self) -> &str {
        self.metadata.foreign_key.as_deref().unwrap_or_default()
    }

    /// Resolved key holder, `Local` before schema compilation.
    pub fn holder(&self) -> KeyHolder {
        self.metadata.holder.unwrap_or(KeyHolder::Local)
    }
}

/// The variant-specific part of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Scalar { data_type: DataModelType },
    Object { fields: Vec<Field> },
    Relation(RelationField),
}

/// A field descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub type_name: String,
    #[serde(default)]
    pub list: bool,
    #[serde(default)]
    pub non_null: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub auto_generated: bool,
    #[serde(default)]
    pub updated_at: bool,
    pub kind: FieldKind,
}

impl Field {
    fn with_kind(name: &str, type_name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            list: false,
            non_null: false,
            unique: false,
            auto_generated: false,
            updated_at: false,
            kind,
        }
    }

    /// The auto-generated unique `id` field.
    pub fn id() -> Self {
        Self::scalar(ID_FIELD, DataModelType::Id)
            .unique()
            .non_null()
            .auto_generated()
    }

    /// A scalar field named with the type's default type name.
    pub fn scalar(name: &str, data_type: DataModelType) -> Self {
        Self::with_kind(name, data_type.type_name(), FieldKind::Scalar { data_type })
    }

    /// A DateTime field stamped on every write.
    pub fn updated_at_field(name: &str) -> Self {
        let mut field = Self::scalar(name, DataModelType::DateTime);
        field.updated_at = true;
        field
    }

    /// A nested object field.
    pub fn object(name: &str, type_name: &str, fields: Vec<Field>) -> Self {
        Self::with_kind(name, type_name, FieldKind::Object { fields })
    }

    /// A relation field pointing at `target`.
    pub fn relation(name: &str, target: &str, relation_type: RelationType) -> Self {
        Self::with_kind(
            name,
            target,
            FieldKind::Relation(RelationField {
                target: target.into(),
                relation_name: None,
                relation_type,
                metadata: RelationMetadata::default(),
            }),
        )
    }

    #[must_use]
    pub fn list(mut self) -> Self {
        self.list = true;
        self
    }

    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub fn non_null(mut self) -> Self {
        self.non_null = true;
        self
    }

    #[must_use]
    pub fn auto_generated(mut self) -> Self {
        self.auto_generated = true;
        self
    }

    /// Sets the relation name. No-op on non-relation fields.
    #[must_use]
    pub fn relation_name(mut self, name: &str) -> Self {
        if let FieldKind::Relation(rel) = &mut self.kind {
            rel.relation_name = Some(name.into());
        }
        self
    }

    /// Overrides the foreign-key name. No-op on non-relation fields.
    #[must_use]
    pub fn foreign_key(mut self, key: &str) -> Self {
        if let FieldKind::Relation(rel) = &mut self.kind {
            rel.metadata.foreign_key = Some(key.into());
        }
        self
    }

    /// Marks this field as the owning side of a bidirectional one-to-one.
    #[must_use]
    pub fn owner(mut self) -> Self {
        if let FieldKind::Relation(rel) = &mut self.kind {
            rel.metadata.owner = true;
        }
        self
    }

    pub fn data_type(&self) -> DataModelType {
        match &self.kind {
            FieldKind::Scalar { data_type } => *data_type,
            FieldKind::Object { .. } => DataModelType::Object,
            FieldKind::Relation(_) => DataModelType::Relation,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.kind, FieldKind::Scalar { .. })
    }

    pub fn is_relation(&self) -> bool {
        matches!(self.kind, FieldKind::Relation(_))
    }

    pub fn as_relation(&self) -> Option<&RelationField> {
        match &self.kind {
            FieldKind::Relation(rel) => Some(rel),
            _ => None,
        }
    }

    pub(crate) fn as_relation_mut(&mut self) -> Option<&mut RelationField> {
        match &mut self.kind {
            FieldKind::Relation(rel) => Some(rel),
            _ => None,
        }
    }

    /// Nested fields of an object field.
    pub fn object_fields(&self) -> Option<&[Field]> {
        match &self.kind {
            FieldKind::Object { fields } => Some(fields),
            _ => None,
        }
    }

    /// Looks up a nested field of an object field.
    pub fn object_field(&self, name: &str) -> Option<&Field> {
        self.object_fields()?.iter().find(|f| f.name == name)
    }
}
