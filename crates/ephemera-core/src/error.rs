use crate::validation::ContentRejection;
use thiserror::Error;

/// Errors raised by repository backends and the connection pool.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("paste id already exists: {0}")]
    Conflict(String),
    #[error("connection pool exhausted: {0}")]
    PoolExhausted(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage initialization failed: {0}")]
    Initialization(String),
}

/// Errors surfaced by the paste lifecycle operations.
#[derive(Debug, Clone, Error)]
pub enum PasteError {
    #[error("invalid content: {0}")]
    InvalidContent(#[from] ContentRejection),
    #[error("invalid paste id: {0}")]
    InvalidId(String),
    #[error("paste not found")]
    NotFound,
    #[error("no unique paste id after {attempts} attempts")]
    CollisionExhausted { attempts: usize },
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Errors raised while assembling core configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("unknown expiry key: {0}")]
    UnknownExpiry(String),
    #[error("invalid identifier length {0}; expected 1..=64")]
    InvalidIdLength(usize),
}
