//! Error types for database operations.

use thiserror::Error;
use valor_core::HeroId;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Native DB error.
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A row referenced by a write set does not exist.
    #[error("Row not found: {0}")]
    NotFound(String),

    /// The hero a write set is scoped to does not exist.
    #[error("Hero not found: {0}")]
    HeroNotFound(HeroId),

    /// The hero row changed since the write set was prepared.
    #[error("Version conflict on {hero_id}: expected {expected}, found {found}")]
    Conflict {
        hero_id: HeroId,
        expected: u64,
        found: u64,
    },
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<native_db::db_type::Error> for Error {
    fn from(err: native_db::db_type::Error) -> Self {
        Error::Database(err.to_string())
    }
}
