use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use ephemera_core::error::StorageError;
use ephemera_core::repository::{
    ttl_seconds, Paste, PasteReceipt, PasteStats, ReadRepository, Repository, Result,
};
use ephemera_core::{Clock, PasteId, SystemClock};
use jiff::{SignedDuration, Timestamp};
use std::time::Duration;

#[derive(Debug, Clone)]
struct StoredPaste {
    content: String,
    created_at: Timestamp,
    expires_at: Timestamp,
}

/// In-memory repository for tests and local development.
///
/// Follows the same visibility and conflict rules as the SQLite backend,
/// using the injected clock in place of the database clock.
#[derive(Debug)]
pub struct InMemoryRepository<C = SystemClock> {
    storage: DashMap<String, StoredPaste>,
    clock: C,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> InMemoryRepository<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            storage: DashMap::new(),
            clock,
        }
    }

    /// Number of stored rows, expired ones included.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

#[async_trait]
impl<C: Clock> ReadRepository for InMemoryRepository<C> {
    async fn get(&self, id: &PasteId) -> Result<Option<Paste>> {
        let now = self.clock.now();
        Ok(self
            .storage
            .get(id.as_str())
            .filter(|stored| stored.expires_at > now)
            .map(|stored| Paste {
                id: id.clone(),
                content: stored.content.clone(),
                created_at: stored.created_at,
                expires_at: stored.expires_at,
            }))
    }

    async fn stats(&self) -> Result<PasteStats> {
        let now = self.clock.now();
        let mut stats = PasteStats::default();
        for entry in self.storage.iter() {
            stats.total += 1;
            if entry.expires_at > now {
                stats.active += 1;
            } else {
                stats.expired += 1;
            }
        }
        Ok(stats)
    }
}

#[async_trait]
impl<C: Clock> Repository for InMemoryRepository<C> {
    async fn insert(&self, id: &PasteId, content: &str, ttl: Duration) -> Result<PasteReceipt> {
        let ttl = ttl_seconds(ttl)?;
        let created_at = self.clock.now();
        let expires_at = created_at
            .checked_add(SignedDuration::from_secs(ttl))
            .map_err(|e| StorageError::InvalidData(format!("expiry out of range: {e}")))?;

        match self.storage.entry(id.as_str().to_owned()) {
            Entry::Occupied(_) => Err(StorageError::Conflict(id.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(StoredPaste {
                    content: content.to_owned(),
                    created_at,
                    expires_at,
                });
                Ok(PasteReceipt {
                    id: id.clone(),
                    created_at,
                    expires_at,
                })
            }
        }
    }

    async fn delete_expired(&self) -> Result<u64> {
        let now = self.clock.now();
        let mut removed = 0u64;
        self.storage.retain(|_, stored| {
            let keep = stored.expires_at > now;
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }
}
