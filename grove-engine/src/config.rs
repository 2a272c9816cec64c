use crate::error::EngineResult;
use grove_storage::ListQuantifier;
use serde::Deserialize;

/// Engine behaviour switches.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Write the current UTC time into `updated_at` fields on create and
    /// update.
    pub stamp_updated_at: bool,
    /// Quantifier for list-relation where inputs given without
    /// `some`/`none`/`every`.
    pub list_relation_default: ListQuantifier,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stamp_updated_at: true,
            list_relation_default: ListQuantifier::Some,
        }
    }
}

impl EngineConfig {
    /// Parses a TOML document; missing keys keep their defaults.
    ///
    /// ```toml
    /// stamp_updated_at = false
    /// list_relation_default = "every"
    /// ```
    pub fn from_toml_str(source: &str) -> EngineResult<Self> {
        Ok(toml::from_str(source)?)
    }
}
