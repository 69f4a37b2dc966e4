//! Storage backends for pastes.
//!
//! [`SqliteRepository`] is the durable backend; every operation runs in its
//! own transaction on a connection checked out of a [`ConnectionPool`].
//! [`InMemoryRepository`] keeps pastes in process memory and is meant for
//! development and tests.

pub mod error;
pub mod memory;
pub mod pool;
pub mod sqlite;

pub use ephemera_core::repository::{ReadRepository, Repository};
pub use ephemera_core::StorageError;
pub use memory::InMemoryRepository;
pub use pool::{ConnectionPool, PoolConfig, ScopedTransaction};
pub use sqlite::SqliteRepository;
