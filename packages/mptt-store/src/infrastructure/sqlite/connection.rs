//! SQLite connection manager
//!
//! Owns the connection shared by every repository operation of one unit of
//! work and demarcates transactions on it.

use parking_lot::{Mutex, MutexGuard};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::DatabaseConfig;
use crate::domain::ports::TransactionManager;
use crate::error::{Result, StorageError};

/// Path value selecting a private in-memory database
pub const IN_MEMORY_PATH: &str = ":memory:";

/// Shared SQLite connection with caller-driven transactions
///
/// `begin_transaction` issues `BEGIN IMMEDIATE`, so the database write lock is
/// held from the first renumbering statement until commit. Concurrent writers
/// on the same file wait (up to the busy timeout) instead of interleaving
/// their shifts.
#[derive(Clone)]
pub struct ConnectionManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConnectionManager {
    /// Open (or create) the database file at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        debug!("open: sqlite database at {}", path.as_ref().display());
        Ok(Self::wrap(conn))
    }

    /// Create a private in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::wrap(conn))
    }

    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        let manager = if config.path == IN_MEMORY_PATH {
            Self::open_in_memory()?
        } else {
            Self::open(&config.path)?
        };
        manager
            .get()
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        Ok(manager)
    }

    fn wrap(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Connection of the current unit of work
    pub fn get(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    pub fn is_in_transaction(&self) -> bool {
        !self.get().is_autocommit()
    }
}

impl TransactionManager for ConnectionManager {
    fn begin_transaction(&self) -> Result<()> {
        let conn = self.get();
        if !conn.is_autocommit() {
            return Err(StorageError::transaction("transaction already active"));
        }
        conn.execute_batch("BEGIN IMMEDIATE")?;
        debug!("begin_transaction");
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        let conn = self.get();
        if conn.is_autocommit() {
            return Err(StorageError::transaction("commit without active transaction"));
        }
        conn.execute_batch("COMMIT")
            .map_err(|e| StorageError::transaction(format!("COMMIT failed: {}", e)).with_source(e))?;
        debug!("commit");
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        let conn = self.get();
        if conn.is_autocommit() {
            return Err(StorageError::transaction("rollback without active transaction"));
        }
        conn.execute_batch("ROLLBACK").map_err(|e| {
            StorageError::transaction(format!("ROLLBACK failed: {}", e)).with_source(e)
        })?;
        debug!("rollback");
        Ok(())
    }
}
