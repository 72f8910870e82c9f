use thiserror::Error;

use super::config::ConfigError;
use crate::core::grid::error::GridError;
use crate::core::hist::error::HistError;
use crate::core::models::ids::BodyId;
use crate::core::models::molecule::MoleculeError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Histogram error: {source}")]
    Hist {
        #[from]
        source: HistError,
    },

    #[error("Grid error: {source}")]
    Grid {
        #[from]
        source: GridError,
    },

    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Body not found in molecule: {0:?}")]
    BodyNotFound(BodyId),

    #[error("Failed to build worker thread pool: {0}")]
    ThreadPool(String),

    #[error("Internal logic error: {0}")]
    Internal(String),
}

impl From<MoleculeError> for EngineError {
    fn from(error: MoleculeError) -> Self {
        match error {
            MoleculeError::BodyNotFound(id) => EngineError::BodyNotFound(id),
        }
    }
}
