//! Where-key grammar: `field`, `field_op`, `object__sub`, `object__sub_op`.

use crate::error::{FilterError, FilterResult};
use grove_storage::Operator;

/// A where key split into its field path and operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKey {
    /// Field path; a flattened nested field reads `object.sub`.
    pub path: String,
    pub operator: Operator,
}

impl ParsedKey {
    /// The top-level field the path starts at.
    pub fn root(&self) -> &str {
        self.path.split('.').next().unwrap_or(&self.path)
    }

    /// The nested part of a flattened path.
    pub fn sub_path(&self) -> Option<&str> {
        self.path.split_once('.').map(|(_, sub)| sub)
    }
}

/// Splits a where key.
///
/// The first `__` becomes a `.`, then everything after the last `_` must be a
/// known operator. A key without `_` is an equality.
pub fn parse_key(key: &str) -> FilterResult<ParsedKey> {
    let key = key.replacen("__", ".", 1);
    let Some((path, suffix)) = key.rsplit_once('_') else {
        return Ok(ParsedKey {
            path: key,
            operator: Operator::Eq,
        });
    };
    let operator = Operator::from_suffix(suffix).ok_or_else(|| FilterError::UnsupportedOperator {
        key: key.clone(),
        operator: suffix.into(),
    })?;
    Ok(ParsedKey {
        path: path.into(),
        operator,
    })
}
