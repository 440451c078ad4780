use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::debug;

use crate::config::StoreConfig;
use crate::error::{Result, Step, StoreError};

pub type DbPool = Pool<SqliteConnectionManager>;

/// Build the connection pool and make sure the accounts table exists.
///
/// Every pooled connection gets the configured busy timeout and, for file
/// databases, WAL journaling. An in-memory database lives inside a single
/// connection, so its pool is pinned to one connection that is never recycled.
pub fn create_pool(config: &StoreConfig) -> Result<DbPool> {
    config.validate()?;

    let busy_timeout = config.busy_timeout();
    let wal = config.wal && !config.is_in_memory();

    let manager = if config.is_in_memory() {
        SqliteConnectionManager::memory()
    } else {
        SqliteConnectionManager::file(&config.database)
    }
    .with_init(move |conn| {
        conn.busy_timeout(busy_timeout)?;
        if wal {
            conn.pragma_update(None, "journal_mode", "WAL")?;
        }
        Ok(())
    });

    let builder = if config.is_in_memory() {
        Pool::builder()
            .max_size(1)
            .min_idle(Some(1))
            .max_lifetime(None)
            .idle_timeout(None)
    } else {
        Pool::builder()
            .max_size(config.max_connections)
            .min_idle(Some(config.min_idle))
            .max_lifetime(config.max_lifetime())
    };

    let pool = builder
        .build(manager)
        .map_err(|e| StoreError::pool(Step::Open, e))?;

    {
        let conn = pool.get().map_err(|e| StoreError::pool(Step::Open, e))?;
        setup_database(&conn)?;
    }

    debug!(
        database = %config.database.display(),
        max_connections = pool.max_size(),
        "Opened account database pool"
    );
    Ok(pool)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // ==========================================================================
    // Accounts Table
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS accounts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            balance REAL NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .map_err(|e| StoreError::store(Step::Schema, e))?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_accounts_email ON accounts(email)",
        [],
    )
    .map_err(|e| StoreError::store(Step::Schema, e))?;

    Ok(())
}
