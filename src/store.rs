//! Account store: CRUD on the accounts table plus the atomic balance transfer.
//!
//! The store owns an r2d2 pool and checks out one connection per operation;
//! the connection goes back to the pool when the guard drops, on success and
//! error paths alike. One store can be shared by reference across threads.
//! Transfers are serialized by the write lock taken at the start of the
//! transfer transaction.

use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, Row, Transaction, TransactionBehavior};
use tracing::{debug, info, warn};

use crate::config::{StoreConfig, IN_MEMORY};
use crate::db::{create_pool, DbPool};
use crate::entities::{Account, AccountId, NewAccount};
use crate::error::{Result, Step, StoreError};

const SELECT_ACCOUNT: &str = "SELECT id, name, email, balance FROM accounts";

type PooledConn = PooledConnection<SqliteConnectionManager>;

pub struct AccountStore {
    pool: DbPool,
}

impl AccountStore {
    pub fn open(config: &StoreConfig) -> Result<Self> {
        Ok(Self {
            pool: create_pool(config)?,
        })
    }

    /// Private in-memory database, gone when the store is dropped
    pub fn open_in_memory() -> Result<Self> {
        Self::open(&StoreConfig::for_path(IN_MEMORY))
    }

    /// Pool behind the store, for callers that want its state
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    fn acquire(&self) -> Result<PooledConn> {
        self.pool.get().map_err(|e| StoreError::pool(Step::Acquire, e))
    }

    // ========================================================================
    // CRUD
    // ========================================================================

    /// Insert one row and return it with the id the database assigned.
    /// No validation beyond the schema's NOT NULL columns.
    pub fn insert_account(&self, account: &NewAccount) -> Result<Account> {
        let conn = self.acquire()?;
        conn.execute(
            "INSERT INTO accounts (name, email, balance) VALUES (?1, ?2, ?3)",
            params![account.name, account.email, account.balance],
        )
        .map_err(|e| StoreError::store(Step::Insert, e))?;

        // Same connection as the insert, so the rowid is ours
        let id = conn.last_insert_rowid();
        debug!(id, name = %account.name, "Inserted account");

        Ok(account.clone().with_id(id))
    }

    /// All accounts in the table's natural order
    pub fn list_accounts(&self) -> Result<Vec<Account>> {
        let conn = self.acquire()?;
        let mut stmt = conn
            .prepare(SELECT_ACCOUNT)
            .map_err(|e| StoreError::store(Step::List, e))?;

        let accounts = stmt
            .query_map([], map_account)
            .map_err(|e| StoreError::store(Step::List, e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| StoreError::store(Step::List, e))?;

        Ok(accounts)
    }

    pub fn get_account(&self, id: AccountId) -> Result<Account> {
        let conn = self.acquire()?;
        let account = conn
            .query_row(&format!("{SELECT_ACCOUNT} WHERE id = ?1"), [id], map_account)
            .optional()
            .map_err(|e| StoreError::store(Step::Lookup, e))?;

        account.ok_or(StoreError::NotFound { id })
    }

    // ========================================================================
    // TRANSFER
    // ========================================================================

    /// Move `amount` from one account to another, all or nothing.
    ///
    /// The transaction starts IMMEDIATE so the write lock is held before the
    /// sender's balance is read; a concurrent transfer blocks (up to the busy
    /// timeout) until this one commits or rolls back.
    pub fn transfer_balance(&self, from: AccountId, to: AccountId, amount: f64) -> Result<()> {
        if !(amount.is_finite() && amount > 0.0) {
            return Err(StoreError::InvalidArgument { amount });
        }

        let mut conn = self.acquire()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| StoreError::store(Step::Begin, e))?;

        if let Err(err) = apply_transfer(&tx, from, to, amount) {
            // Rollback failure is logged only; the caller sees the original error
            if let Err(rollback_err) = tx.rollback() {
                warn!(
                    from,
                    to,
                    error = %rollback_err,
                    "Rollback after failed transfer did not complete"
                );
            }
            debug!(from, to, amount, error = %err, "Transfer rolled back");
            return Err(err);
        }

        // Dropping a transaction whose COMMIT failed rolls it back
        tx.commit().map_err(|e| StoreError::store(Step::Commit, e))?;

        info!(from, to, amount, "Transfer committed");
        Ok(())
    }
}

/// Debit and credit inside an open transaction. Any error leaves the
/// transaction for the caller to roll back.
fn apply_transfer(
    tx: &Transaction<'_>,
    from: AccountId,
    to: AccountId,
    amount: f64,
) -> Result<()> {
    let from_balance: f64 = tx
        .query_row("SELECT balance FROM accounts WHERE id = ?1", [from], |row| row.get(0))
        .map_err(|e| StoreError::store(Step::BalanceRead, e))?;

    if from_balance < amount {
        return Err(StoreError::InsufficientFunds {
            id: from,
            balance: from_balance,
        });
    }

    tx.execute(
        "UPDATE accounts SET balance = balance - ?1 WHERE id = ?2",
        params![amount, from],
    )
    .map_err(|e| StoreError::store(Step::Debit, e))?;

    let credited = tx
        .execute(
            "UPDATE accounts SET balance = balance + ?1 WHERE id = ?2",
            params![amount, to],
        )
        .map_err(|e| StoreError::store(Step::Credit, e))?;

    // Crediting a missing account would silently destroy the debited funds
    if credited == 0 {
        return Err(StoreError::NotFound { id: to });
    }

    Ok(())
}

fn map_account(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        balance: row.get(3)?,
    })
}
