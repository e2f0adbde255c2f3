//! Error types for valor-ledger
//!
//! Ledger operations fail with the domain taxonomy in [`valor_core::Error`].
//! This module only adds the configuration error and the mapping from store
//! faults into that taxonomy.

use thiserror::Error;
use valor_core::Error;

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Map a store fault into the ledger taxonomy
pub(crate) fn store_error(err: valor_db::Error) -> Error {
    match err {
        valor_db::Error::HeroNotFound(id) => Error::HeroNotFound(id),
        other => Error::Internal(other.to_string()),
    }
}
