use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tokio::sync::watch;

use crate::errors::StorageError;
use crate::models::history::HistoryEntry;

/// Display window for history queries, in days.
const HISTORY_WINDOW_DAYS: i64 = 4;

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS exchange_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_symbol TEXT NOT NULL,
    target_symbol TEXT NOT NULL,
    source_amount TEXT NOT NULL,
    target_amount TEXT NOT NULL,
    timestamp INTEGER NOT NULL
)";

const SELECT_RECENT: &str = "\
SELECT source_symbol, target_symbol, source_amount, target_amount, timestamp \
FROM exchange_history WHERE timestamp >= ? ORDER BY timestamp DESC";

/// Embedded SQLite store for conversion history.
///
/// Rows are insert-only. Reads cover the last four days; older rows stay in
/// the table but fall out of every query. Each successful insert bumps a
/// change counter that live subscriptions wait on.
pub struct HistoryStore {
    pool: SqlitePool,
    changes: watch::Sender<u64>,
}

impl HistoryStore {
    /// Open (creating if missing) the history database at `database_url`,
    /// e.g. `sqlite://history.db` or `sqlite::memory:`.
    pub async fn open(database_url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(StorageError::from)?
            .create_if_missing(true);
        // A `:memory:` database exists per connection; keep exactly one
        // connection alive so every query sees the same database.
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .connect_with(options)
                .await
        } else {
            SqlitePool::connect_with(options).await
        }
        .map_err(StorageError::from)?;

        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .map_err(StorageError::from)?;

        let (changes, _) = watch::channel(0);
        Ok(Self { pool, changes })
    }

    /// Insert a conversion record.
    pub async fn add(&self, entry: &HistoryEntry) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO exchange_history \
             (source_symbol, target_symbol, source_amount, target_amount, timestamp) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&entry.source_symbol)
        .bind(&entry.target_symbol)
        .bind(&entry.source_amount)
        .bind(&entry.target_amount)
        .bind(entry.timestamp)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;

        self.changes.send_modify(|n| *n += 1);
        Ok(())
    }

    /// Entries from the last four days, newest first.
    pub async fn recent(&self) -> Result<Vec<HistoryEntry>, StorageError> {
        fetch_recent(&self.pool).await
    }

    /// Live view of [`recent`](Self::recent): the first emission is
    /// immediate, every later one follows an insert.
    pub fn subscribe(&self) -> HistoryUpdates {
        HistoryUpdates {
            pool: self.pool.clone(),
            changes: self.changes.subscribe(),
            primed: false,
        }
    }
}

/// A live history subscription. Each [`next`](Self::next) re-runs the
/// four-day query, so emissions always reflect the full current window.
pub struct HistoryUpdates {
    pool: SqlitePool,
    changes: watch::Receiver<u64>,
    primed: bool,
}

impl HistoryUpdates {
    /// Wait for the next emission. Returns `None` once the store is gone.
    pub async fn next(&mut self) -> Option<Result<Vec<HistoryEntry>, StorageError>> {
        if self.primed {
            if self.changes.changed().await.is_err() {
                return None;
            }
        } else {
            self.primed = true;
        }

        Some(fetch_recent(&self.pool).await)
    }
}

async fn fetch_recent(pool: &SqlitePool) -> Result<Vec<HistoryEntry>, StorageError> {
    let cutoff =
        chrono::Utc::now().timestamp_millis() - HISTORY_WINDOW_DAYS * 24 * 60 * 60 * 1000;

    let rows: Vec<DbHistoryRow> = sqlx::query_as(SELECT_RECENT)
        .bind(cutoff)
        .fetch_all(pool)
        .await
        .map_err(StorageError::from)?;

    Ok(rows.into_iter().map(DbHistoryRow::into_entry).collect())
}

#[derive(sqlx::FromRow)]
struct DbHistoryRow {
    source_symbol: String,
    target_symbol: String,
    source_amount: String,
    target_amount: String,
    timestamp: i64,
}

impl DbHistoryRow {
    fn into_entry(self) -> HistoryEntry {
        HistoryEntry {
            source_symbol: self.source_symbol,
            target_symbol: self.target_symbol,
            source_amount: self.source_amount,
            target_amount: self.target_amount,
            timestamp: self.timestamp,
        }
    }
}
