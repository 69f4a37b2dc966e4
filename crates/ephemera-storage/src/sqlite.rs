use crate::error::{is_unique_violation, map_sqlx_error};
use crate::pool::ConnectionPool;
use async_trait::async_trait;
use ephemera_core::error::StorageError;
use ephemera_core::repository::{
    ttl_seconds, Paste, PasteReceipt, PasteStats, ReadRepository, Repository, Result,
};
use ephemera_core::PasteId;
use jiff::Timestamp;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use std::time::Duration;

/// SQLite implementation of the repository contract.
///
/// Timestamps are stored as unix seconds and always come from the database
/// clock, so visibility does not depend on the caller's clock. A row is
/// visible while `expires_at` is in the future and reapable once it is not.
/// Ids are never reused, even by rows that have expired but are not yet
/// deleted.
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    pool: ConnectionPool,
}

impl SqliteRepository {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }
}

fn parse_timestamp(column: &str, seconds: i64) -> Result<Timestamp> {
    Timestamp::from_second(seconds).map_err(|e| {
        StorageError::InvalidData(format!("invalid {column} timestamp '{seconds}': {e}"))
    })
}

fn parse_count(column: &str, value: i64) -> Result<u64> {
    u64::try_from(value)
        .map_err(|_| StorageError::InvalidData(format!("negative {column} count '{value}'")))
}

fn paste_from_row(row: &SqliteRow) -> Result<Paste> {
    let id: String = row.try_get("id").map_err(map_sqlx_error)?;
    let content: String = row.try_get("content").map_err(map_sqlx_error)?;
    let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;
    let expires_at: i64 = row.try_get("expires_at").map_err(map_sqlx_error)?;

    Ok(Paste {
        id: PasteId::new_unchecked(id),
        content,
        created_at: parse_timestamp("created_at", created_at)?,
        expires_at: parse_timestamp("expires_at", expires_at)?,
    })
}

async fn select_visible(conn: &mut SqliteConnection, id: &PasteId) -> Result<Option<Paste>> {
    let row = sqlx::query(
        r#"
        SELECT id, content, created_at, expires_at
        FROM pastes
        WHERE id = ?
          AND expires_at > CAST(strftime('%s', 'now') AS INTEGER)
        LIMIT 1
        "#,
    )
    .bind(id.as_str())
    .fetch_optional(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    row.as_ref().map(paste_from_row).transpose()
}

async fn insert_row(
    conn: &mut SqliteConnection,
    id: &PasteId,
    content: &str,
    ttl: i64,
) -> Result<PasteReceipt> {
    let result = sqlx::query(
        r#"
        INSERT INTO pastes (id, content, created_at, expires_at)
        VALUES (
            ?,
            ?,
            CAST(strftime('%s', 'now') AS INTEGER),
            CAST(strftime('%s', 'now') AS INTEGER) + ?
        )
        RETURNING created_at, expires_at
        "#,
    )
    .bind(id.as_str())
    .bind(content)
    .bind(ttl)
    .fetch_one(&mut *conn)
    .await;

    let row = match result {
        Ok(row) => row,
        Err(err) if is_unique_violation(&err) => {
            return Err(StorageError::Conflict(id.to_string()));
        }
        Err(err) => return Err(map_sqlx_error(err)),
    };

    let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;
    let expires_at: i64 = row.try_get("expires_at").map_err(map_sqlx_error)?;

    Ok(PasteReceipt {
        id: id.clone(),
        created_at: parse_timestamp("created_at", created_at)?,
        expires_at: parse_timestamp("expires_at", expires_at)?,
    })
}

async fn delete_expired_rows(conn: &mut SqliteConnection) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM pastes
        WHERE expires_at <= CAST(strftime('%s', 'now') AS INTEGER)
        "#,
    )
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    Ok(result.rows_affected())
}

async fn count_rows(conn: &mut SqliteConnection) -> Result<PasteStats> {
    // one statement, so all three counts see the same `now`
    let row = sqlx::query(
        r#"
        SELECT
            COUNT(*) AS total,
            COALESCE(SUM(CASE WHEN expires_at > CAST(strftime('%s', 'now') AS INTEGER) THEN 1 ELSE 0 END), 0) AS active,
            COALESCE(SUM(CASE WHEN expires_at <= CAST(strftime('%s', 'now') AS INTEGER) THEN 1 ELSE 0 END), 0) AS expired
        FROM pastes
        "#,
    )
    .fetch_one(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    let total: i64 = row.try_get("total").map_err(map_sqlx_error)?;
    let active: i64 = row.try_get("active").map_err(map_sqlx_error)?;
    let expired: i64 = row.try_get("expired").map_err(map_sqlx_error)?;

    Ok(PasteStats {
        total: parse_count("total", total)?,
        active: parse_count("active", active)?,
        expired: parse_count("expired", expired)?,
    })
}

#[async_trait]
impl ReadRepository for SqliteRepository {
    async fn get(&self, id: &PasteId) -> Result<Option<Paste>> {
        let mut tx = self.pool.begin().await?;
        let outcome = select_visible(tx.connection(), id).await;
        tx.finish(outcome).await
    }

    async fn stats(&self) -> Result<PasteStats> {
        let mut tx = self.pool.begin().await?;
        let outcome = count_rows(tx.connection()).await;
        tx.finish(outcome).await
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn insert(&self, id: &PasteId, content: &str, ttl: Duration) -> Result<PasteReceipt> {
        let ttl = ttl_seconds(ttl)?;
        let mut tx = self.pool.begin().await?;
        let outcome = insert_row(tx.connection(), id, content, ttl).await;
        tx.finish(outcome).await
    }

    async fn delete_expired(&self) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let outcome = delete_expired_rows(tx.connection()).await;
        tx.finish(outcome).await
    }
}
