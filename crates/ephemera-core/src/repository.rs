use crate::error::StorageError;
use crate::paste_id::PasteId;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A stored paste.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paste {
    pub id: PasteId,
    /// The text exactly as submitted.
    pub content: String,
    /// Set by the store at insertion.
    pub created_at: Timestamp,
    /// Always later than `created_at`.
    pub expires_at: Timestamp,
}

impl Paste {
    /// Whether the paste is retrievable at `now`.
    pub fn is_visible_at(&self, now: Timestamp) -> bool {
        self.expires_at > now
    }
}

/// What the store hands back after a successful insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasteReceipt {
    pub id: PasteId,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

/// Row counts, split by visibility at the time of the query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PasteStats {
    pub total: u64,
    pub active: u64,
    pub expired: u64,
}

/// A read-only view of a repository.
#[async_trait]
pub trait ReadRepository: Send + Sync + 'static {
    /// Retrieves a paste if it exists and has not expired.
    ///
    /// Expired and absent pastes both yield `None`. Visibility is decided by
    /// the backend's own clock, not the caller's.
    async fn get(&self, id: &PasteId) -> Result<Option<Paste>>;

    /// Counts total, active and expired rows.
    async fn stats(&self) -> Result<PasteStats>;
}

#[async_trait]
pub trait Repository: ReadRepository {
    /// Inserts a new paste that expires `ttl` after the backend's current time.
    ///
    /// Returns `Err(Conflict)` if the id is already taken, including by an
    /// expired row that has not been reaped yet. `ttl` must be at least one
    /// second.
    async fn insert(&self, id: &PasteId, content: &str, ttl: Duration) -> Result<PasteReceipt>;

    /// Deletes every paste whose expiry has passed and returns how many were removed.
    async fn delete_expired(&self) -> Result<u64>;
}

#[async_trait]
impl<R: ReadRepository + ?Sized> ReadRepository for Arc<R> {
    async fn get(&self, id: &PasteId) -> Result<Option<Paste>> {
        (**self).get(id).await
    }

    async fn stats(&self) -> Result<PasteStats> {
        (**self).stats().await
    }
}

#[async_trait]
impl<R: Repository + ?Sized> Repository for Arc<R> {
    async fn insert(&self, id: &PasteId, content: &str, ttl: Duration) -> Result<PasteReceipt> {
        (**self).insert(id, content, ttl).await
    }

    async fn delete_expired(&self) -> Result<u64> {
        (**self).delete_expired().await
    }
}

/// Converts a lifetime into whole seconds, rejecting sub-second values.
pub fn ttl_seconds(ttl: Duration) -> Result<i64> {
    let seconds = ttl.as_secs();
    if seconds == 0 {
        return Err(StorageError::InvalidData(
            "paste lifetime must be at least one second".to_string(),
        ));
    }
    i64::try_from(seconds)
        .map_err(|_| StorageError::InvalidData(format!("paste lifetime too long: {seconds}s")))
}
