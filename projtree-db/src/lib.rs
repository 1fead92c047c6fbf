//! SQLite connection management for projtree.
//!
//! Every store in the workspace owns one connection behind
//! [`SharedConnection`]. Connections are opened through this crate so they
//! all carry the same pragmas: foreign keys on, a busy timeout so competing
//! writers queue instead of failing immediately, and WAL journaling for
//! file-backed databases.

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// A connection shared between the handles of one store.
pub type SharedConnection = Arc<Mutex<Connection>>;

/// Result type for connection management.
pub type DbResult<T> = Result<T, DbError>;

/// Errors raised while opening or locking a connection.
#[derive(Debug, Error)]
pub enum DbError {
    /// Error from SQLite.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A previous holder of the connection panicked mid-operation.
    #[error("connection lock poisoned")]
    Poisoned,
}

/// Connection settings.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// How long a writer waits for another writer's lock before giving up.
    pub busy_timeout: Duration,
    /// Use write-ahead logging (file-backed databases only).
    pub wal: bool,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_secs(5),
            wal: true,
        }
    }
}

/// Opens (or creates) a database file.
pub fn open(path: &Path, config: &DbConfig) -> DbResult<Connection> {
    let conn = Connection::open(path)?;
    apply_pragmas(&conn, config, true)?;
    info!(path = %path.display(), "Opened database");
    Ok(conn)
}

/// Opens a private in-memory database.
pub fn open_in_memory(config: &DbConfig) -> DbResult<Connection> {
    let conn = Connection::open_in_memory()?;
    apply_pragmas(&conn, config, false)?;
    debug!("Opened in-memory database");
    Ok(conn)
}

/// Wraps a connection for sharing.
#[must_use]
pub fn share(conn: Connection) -> SharedConnection {
    Arc::new(Mutex::new(conn))
}

/// Locks a shared connection, turning poisoning into an error.
pub fn lock(conn: &SharedConnection) -> DbResult<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|_| DbError::Poisoned)
}

fn apply_pragmas(conn: &Connection, config: &DbConfig, file_backed: bool) -> DbResult<()> {
    conn.busy_timeout(config.busy_timeout)?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    if file_backed && config.wal {
        let mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(journal_mode = %mode, "Journal mode set");
    }
    Ok(())
}
