use crate::error::{map_sqlx_error, Result};
use ephemera_core::StorageError;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};
use typed_builder::TypedBuilder;

const SCHEMA: &str = include_str!("../ddl/sqlite/pastes.sql");

/// Connection pool settings.
#[derive(Debug, Clone, TypedBuilder)]
pub struct PoolConfig {
    /// SQLite URL, e.g. `sqlite://pastes.db`. The file is created if missing.
    #[builder(setter(into))]
    pub database_url: String,
    #[builder(default = 1)]
    pub min_connections: u32,
    #[builder(default = 10)]
    pub max_connections: u32,
    /// How long `acquire` waits for a free connection before giving up.
    #[builder(default = Duration::from_secs(5))]
    pub acquire_timeout: Duration,
    /// How long a statement waits on a locked database file.
    #[builder(default = Duration::from_secs(5))]
    pub busy_timeout: Duration,
}

/// A bounded pool of SQLite connections.
///
/// Connections are health-checked before they are handed out; a connection
/// that fails the check is discarded and replaced. Cloning is cheap and all
/// clones share the same connections.
#[derive(Debug, Clone)]
pub struct ConnectionPool {
    pool: SqlitePool,
}

impl ConnectionPool {
    /// Opens the pool, eagerly connecting `min_connections`, and applies the schema.
    pub async fn connect(config: &PoolConfig) -> Result<Self> {
        if config.max_connections == 0 || config.min_connections > config.max_connections {
            return Err(StorageError::Initialization(format!(
                "invalid pool bounds: min {} max {}",
                config.min_connections, config.max_connections
            )));
        }

        let options = SqliteConnectOptions::from_str(&config.database_url)
            .map_err(|e| StorageError::Initialization(e.to_string()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(config.busy_timeout);

        let pool = SqlitePoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .test_before_acquire(true)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Initialization(e.to_string()))?;

        let pool = Self { pool };
        pool.apply_schema().await?;

        info!(
            min_connections = config.min_connections,
            max_connections = config.max_connections,
            "connection pool ready"
        );
        Ok(pool)
    }

    async fn apply_schema(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Initialization(format!("failed to apply schema: {e}")))?;
        Ok(())
    }

    /// Checks out a connection. It goes back to the pool when dropped.
    ///
    /// Fails with [`StorageError::PoolExhausted`] if no connection frees up
    /// within the acquire timeout.
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>> {
        self.pool.acquire().await.map_err(map_sqlx_error)
    }

    /// Checks out a connection and opens a transaction on it.
    pub async fn begin(&self) -> Result<ScopedTransaction> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(ScopedTransaction { tx })
    }

    /// Closes every connection. Pending and future acquires fail.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Connections currently open, idle or in use.
    pub fn size(&self) -> u32 {
        self.pool.size()
    }

    pub fn inner(&self) -> &SqlitePool {
        &self.pool
    }
}

/// A transaction bound to one pooled connection.
///
/// [`finish`](Self::finish) commits when the work succeeded and rolls back
/// when it failed. Dropping the transaction without finishing it rolls back.
/// Either way the connection returns to the pool.
pub struct ScopedTransaction {
    tx: Transaction<'static, Sqlite>,
}

impl ScopedTransaction {
    pub fn connection(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }

    /// Commits on `Ok`, rolls back on `Err`, and passes `outcome` through.
    pub async fn finish<T>(self, outcome: Result<T>) -> Result<T> {
        match outcome {
            Ok(value) => {
                self.tx.commit().await.map_err(map_sqlx_error)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.tx.rollback().await {
                    warn!(error = %rollback_err, "transaction rollback failed");
                }
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for ScopedTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedTransaction").finish_non_exhaustive()
    }
}
