//! Process-wide engine, installed once after schema compilation.

use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};
use std::sync::{Arc, OnceLock};
use tracing::info;

static ENGINE: OnceLock<Arc<Engine>> = OnceLock::new();

/// Installs `engine` for the rest of the process. A second install fails.
pub fn install(engine: Engine) -> EngineResult<Arc<Engine>> {
    let engine = Arc::new(engine);
    ENGINE
        .set(Arc::clone(&engine))
        .map_err(|_| EngineError::AlreadyInstalled)?;
    info!(models = engine.schema().models().len(), "engine installed");
    Ok(engine)
}

/// The installed engine, if any.
pub fn global() -> Option<Arc<Engine>> {
    ENGINE.get().cloned()
}
