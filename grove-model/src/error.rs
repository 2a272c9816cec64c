//! Error types for schema compilation.

use thiserror::Error;

/// Result type for descriptor and schema operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Schema inconsistencies discovered while compiling descriptors.
///
/// These are fatal at schema-compile time and never surface per request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Two models share the same name.
    #[error("model declared twice: {0}")]
    DuplicateModel(String),

    /// A reference names a model that is not part of the schema.
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// A model that is addressed by unique-where inputs declares no unique field.
    #[error("no unique field found in model {0}")]
    NoUniqueField(String),

    /// A bidirectional relation field has no partner on the target model.
    #[error("relation field '{model}.{field}' has no reciprocal field on '{target}'")]
    MissingReciprocal {
        model: String,
        field: String,
        target: String,
    },

    /// The field's list-ness does not fit its declared relation type.
    #[error("relation field '{model}.{field}' is invalid: {reason}")]
    InvalidRelation {
        model: String,
        field: String,
        reason: String,
    },
}
