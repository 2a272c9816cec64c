//! Validation errors raised while compiling where input.

use thiserror::Error;

/// Result type for filter compilation.
pub type FilterResult<T> = Result<T, FilterError>;

/// A malformed where input. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// A key suffix that names no operator, or an operator the field cannot take.
    #[error("operator '{operator}' is not supported (key '{key}')")]
    UnsupportedOperator { key: String, operator: String },

    /// More than one of `some`, `none` or `every` on a list relation.
    #[error("relation filter '{field}' accepts only one of some, none or every")]
    MultipleQuantifiers { field: String },

    /// Two keys compile to a predicate on the same field path.
    #[error("there can be only one predicate on field '{field}'")]
    DuplicateField { field: String },

    /// A unique where with no non-null key.
    #[error("unique where input is empty; provide exactly one unique field and value")]
    EmptyUniqueWhere,

    /// A key addresses a field the model or object type does not declare.
    #[error("model '{model}' has no field '{field}'")]
    UnknownField { model: String, field: String },

    /// A relation field points at a model missing from the schema.
    #[error("relation target model '{0}' is not in the schema")]
    UnknownModel(String),

    /// A value of the wrong shape for its key.
    #[error("invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    /// A scalar-list filter object with more than one operator.
    #[error("list filter on '{field}' accepts exactly one operator")]
    MultipleListOperators { field: String },
}

impl FilterError {
    pub(crate) fn invalid(key: &str, reason: &str) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
