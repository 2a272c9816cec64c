//! Errors raised while compiling or installing an engine.

use grove_model::ModelError;
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ModelError),

    #[error("invalid engine config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("no data source factory was supplied")]
    MissingDataSources,

    #[error("an engine is already installed for this process")]
    AlreadyInstalled,
}
