//! Request-level error taxonomy shared by entry points and hooks.

use grove_filter::FilterError;
use grove_model::ModelError;
use grove_storage::StorageError;
use thiserror::Error;

/// Result type for mutation entry points and hook wrappers.
pub type MutationResult<T> = Result<T, MutationError>;

#[derive(Debug, Error)]
pub enum MutationError {
    /// Malformed where input.
    #[error("validation error: {0}")]
    Validation(#[from] FilterError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A unique filter addressed by update/delete matched nothing.
    #[error("no {model} record matches {filter}")]
    NotFound { model: String, filter: String },

    #[error("configuration error: {0}")]
    Configuration(#[from] ModelError),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Some operations of a concurrent relation batch failed; the others
    /// were applied.
    #[error("{failed} of {total} relation operations failed, first: {first}")]
    Batch {
        failed: usize,
        total: usize,
        first: Box<MutationError>,
    },

    /// An extension vetoed the operation.
    #[error("rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Extension(#[from] anyhow::Error),
}

impl MutationError {
    pub fn not_found(model: &str, filter: impl std::fmt::Display) -> Self {
        Self::NotFound {
            model: model.into(),
            filter: filter.to_string(),
        }
    }

    /// Aggregates the failures of a batch; `None` when every result is `Ok`.
    pub fn from_batch<T>(results: Vec<MutationResult<T>>) -> Option<Self> {
        let total = results.len();
        let mut errors = results.into_iter().filter_map(Result::err);
        let first = errors.next()?;
        Some(Self::Batch {
            failed: 1 + errors.count(),
            total,
            first: Box::new(first),
        })
    }
}
