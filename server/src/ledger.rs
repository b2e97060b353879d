//! Durable per-user balance store.
//!
//! One SQLite database holds the rows; an in-process per-user async mutex
//! is the row lock. A mutation acquires the row lock, then runs the whole
//! read-modify-write as one immediate transaction on a blocking task, so
//! concurrent requests for the same user serialize while requests for
//! different users only share the (briefly held) connection.

use parlor_types::{Amount, STARTING_BALANCE};
use rusqlite::{params, Connection, ErrorCode, TransactionBehavior};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex as RowLock;
use tokio::time::timeout;

pub type UserId = i64;

/// How long a mutation waits for the row lock before reporting a
/// conflict.
const ROW_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("user not found")]
    NotFound,
    #[error("could not lock the balance row")]
    Conflict,
    #[error("balance arithmetic overflow")]
    Overflow,
    #[error("ledger storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("ledger internal error: {0}")]
    Internal(String),
}

fn storage_error(err: rusqlite::Error) -> LedgerError {
    match err.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => LedgerError::Conflict,
        _ => LedgerError::Storage(err),
    }
}

pub struct Ledger {
    conn: Arc<StdMutex<Connection>>,
    rows: StdMutex<HashMap<UserId, Arc<RowLock<()>>>>,
    lock_timeout: Duration,
    starting_balance: Amount,
}

impl Ledger {
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(StdMutex::new(conn)),
            rows: StdMutex::new(HashMap::new()),
            lock_timeout: ROW_LOCK_TIMEOUT,
            starting_balance: STARTING_BALANCE,
        })
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// Override the balance granted to new users.
    pub fn with_starting_balance(mut self, starting_balance: Amount) -> Self {
        self.starting_balance = starting_balance;
        self
    }

    /// Create a user with the starting balance, or return the existing
    /// row. Account creation proper belongs to the auth subsystem; this
    /// is the seam it calls.
    pub async fn create_user(&self, username: &str) -> Result<(UserId, Amount), LedgerError> {
        let conn = Arc::clone(&self.conn);
        let username = username.to_string();
        let starting_balance = self.starting_balance;
        run_blocking(move || {
            let conn = lock_conn(&conn)?;
            conn.execute(
                "INSERT INTO users (username, balance_cents) VALUES (?1, ?2)
                 ON CONFLICT(username) DO NOTHING",
                params![username, starting_balance.cents()],
            )
            .map_err(storage_error)?;
            let (id, cents) = conn
                .query_row(
                    "SELECT id, balance_cents FROM users WHERE username = ?1",
                    params![username],
                    |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
                )
                .map_err(storage_error)?;
            Ok((id, Amount::from_cents(cents)))
        })
        .await
    }

    /// Unlocked read of the committed balance.
    pub async fn balance(&self, user: UserId) -> Result<Amount, LedgerError> {
        let conn = Arc::clone(&self.conn);
        run_blocking(move || {
            let conn = lock_conn(&conn)?;
            read_balance(&conn, user)
        })
        .await
    }

    /// Locked read-modify-write.
    ///
    /// `f` receives the committed balance and returns the value to
    /// persist; the read and write share one immediate transaction held
    /// under the user's row lock, so no concurrent mutation for the same
    /// user can interleave. Any error rolls the transaction back with no
    /// observable partial state.
    pub async fn mutate<F>(&self, user: UserId, f: F) -> Result<Amount, LedgerError>
    where
        F: FnOnce(Amount) -> Result<Amount, LedgerError> + Send + 'static,
    {
        let row = self.row_lock(user);
        let _guard = timeout(self.lock_timeout, row.lock_owned())
            .await
            .map_err(|_| LedgerError::Conflict)?;

        let conn = Arc::clone(&self.conn);
        run_blocking(move || {
            let mut conn = lock_conn(&conn)?;
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(storage_error)?;
            let current = read_balance(&tx, user)?;
            let next = f(current)?;
            tx.execute(
                "UPDATE users SET balance_cents = ?1 WHERE id = ?2",
                params![next.cents(), user],
            )
            .map_err(storage_error)?;
            tx.commit().map_err(storage_error)?;
            Ok(next)
        })
        .await
    }

    fn row_lock(&self, user: UserId) -> Arc<RowLock<()>> {
        let mut rows = match self.rows.lock() {
            Ok(rows) => rows,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(rows.entry(user).or_default())
    }
}

fn init_schema(conn: &Connection) -> Result<(), LedgerError> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA synchronous=NORMAL;
         CREATE TABLE IF NOT EXISTS users (
             id            INTEGER PRIMARY KEY AUTOINCREMENT,
             username      TEXT NOT NULL UNIQUE,
             balance_cents INTEGER NOT NULL
         );",
    )?;
    Ok(())
}

fn read_balance(conn: &Connection, user: UserId) -> Result<Amount, LedgerError> {
    conn.query_row(
        "SELECT balance_cents FROM users WHERE id = ?1",
        params![user],
        |row| row.get::<_, i64>(0),
    )
    .map(Amount::from_cents)
    .map_err(|err| match err {
        rusqlite::Error::QueryReturnedNoRows => LedgerError::NotFound,
        other => storage_error(other),
    })
}

fn lock_conn(
    conn: &Arc<StdMutex<Connection>>,
) -> Result<std::sync::MutexGuard<'_, Connection>, LedgerError> {
    conn.lock()
        .map_err(|_| LedgerError::Internal("connection mutex poisoned".into()))
}

async fn run_blocking<T, F>(f: F) -> Result<T, LedgerError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, LedgerError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| LedgerError::Internal(format!("ledger task: {err}")))?
}
