//! SQLite record store for entries.
//!
//! All reads and writes happen inside a [`RecordTx`]. Mutating work runs in
//! `BEGIN IMMEDIATE` transactions, so writers on the same database are
//! serialized by SQLite's write lock; a writer that cannot get the lock
//! within the busy timeout surfaces as [`StoreError::TransactionConflict`].
//!
//! Sibling uniqueness is also enforced by the schema: a unique index over
//! `(project_id, parent_key, kind, name)`, where `parent_key` is the parent
//! id or `''` at the project root (SQLite treats NULLs as distinct in unique
//! indexes, so `parent_id` alone cannot back the constraint).
//!
//! A blob belongs to at most one entry: `storage_id` carries a partial unique
//! index, so a cascade delete never removes a blob a surviving entry points at.

use crate::error::{is_unique_violation, is_unique_violation_on};
use crate::{StoreError, StoreResult};
use projtree_db::{DbConfig, SharedConnection};
use projtree_types::{Entry, EntryId, EntryKind, ProjectId, StorageId, Timestamp};
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, Row, Transaction, TransactionBehavior, params};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

const ENTRY_COLUMNS: &str =
    "id, project_id, parent_id, name, kind, content, storage_id, updated_at";

/// Handle to the entry and project tables. Cloning shares the connection.
#[derive(Clone)]
pub struct RecordStore {
    conn: SharedConnection,
}

impl RecordStore {
    /// Opens (or creates) a record store at `path`.
    pub fn open(path: &Path, config: &DbConfig) -> StoreResult<Self> {
        let conn = projtree_db::open(path, config)?;
        Self::open_with_conn(projtree_db::share(conn))
    }

    /// Opens an in-memory record store.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = projtree_db::open_in_memory(&DbConfig::default())?;
        Self::open_with_conn(projtree_db::share(conn))
    }

    /// Uses an existing connection, creating tables if needed.
    pub fn open_with_conn(conn: SharedConnection) -> StoreResult<Self> {
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = projtree_db::lock(&self.conn)?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS entries (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL REFERENCES projects(id),
                parent_id TEXT REFERENCES entries(id),
                parent_key TEXT NOT NULL,
                name TEXT NOT NULL,
                kind TEXT NOT NULL CHECK (kind IN ('file', 'folder')),
                content TEXT,
                storage_id TEXT,
                updated_at INTEGER NOT NULL,
                CHECK (kind = 'file' OR (content IS NULL AND storage_id IS NULL)),
                CHECK (parent_key = COALESCE(parent_id, ''))
            );

            -- Also serves lookups by (project_id, parent_key).
            CREATE UNIQUE INDEX IF NOT EXISTS idx_entries_sibling_name
                ON entries(project_id, parent_key, kind, name);

            CREATE UNIQUE INDEX IF NOT EXISTS idx_entries_storage_id
                ON entries(storage_id) WHERE storage_id IS NOT NULL;
            ",
        )?;
        Ok(())
    }

    /// Runs `f` in a write transaction. Commits if `f` succeeds, rolls back
    /// otherwise.
    pub fn transaction<T>(&self, f: impl FnOnce(&RecordTx<'_>) -> StoreResult<T>) -> StoreResult<T> {
        self.run(TransactionBehavior::Immediate, f)
    }

    /// Runs `f` in a read transaction, giving it a consistent snapshot.
    pub fn read<T>(&self, f: impl FnOnce(&RecordTx<'_>) -> StoreResult<T>) -> StoreResult<T> {
        self.run(TransactionBehavior::Deferred, f)
    }

    fn run<T>(
        &self,
        behavior: TransactionBehavior,
        f: impl FnOnce(&RecordTx<'_>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut conn = projtree_db::lock(&self.conn)?;
        let tx = RecordTx {
            tx: conn.transaction_with_behavior(behavior)?,
        };
        // Dropping an uncommitted transaction rolls it back.
        let out = f(&tx)?;
        tx.tx.commit()?;
        Ok(out)
    }
}

/// An open transaction on the record store.
pub struct RecordTx<'conn> {
    pub(crate) tx: Transaction<'conn>,
}

impl RecordTx<'_> {
    /// Loads one entry.
    pub fn entry(&self, id: EntryId) -> StoreResult<Option<Entry>> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?1");
        Ok(self
            .tx
            .query_row(&sql, params![id.to_string()], entry_from_row)
            .optional()?)
    }

    /// Direct children of `parent_id` (or root entries), unordered.
    pub fn children(&self, project_id: ProjectId, parent_id: Option<EntryId>) -> StoreResult<Vec<Entry>> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM entries WHERE project_id = ?1 AND parent_key = ?2"
        );
        let mut stmt = self.tx.prepare_cached(&sql)?;
        let rows = stmt.query_map(
            params![project_id.to_string(), parent_key(parent_id)],
            entry_from_row,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Every entry of a project, unordered.
    pub fn project_entries(&self, project_id: ProjectId) -> StoreResult<Vec<Entry>> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE project_id = ?1");
        let mut stmt = self.tx.prepare_cached(&sql)?;
        let rows = stmt.query_map(params![project_id.to_string()], entry_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// True if some entry, in any project, references the blob.
    pub fn storage_in_use(&self, storage_id: StorageId) -> StoreResult<bool> {
        Ok(self
            .tx
            .query_row(
                "SELECT 1 FROM entries WHERE storage_id = ?1",
                params![storage_id.to_string()],
                |_| Ok(()),
            )
            .optional()?
            .is_some())
    }

    /// Inserts a new entry.
    pub fn insert_entry(&self, entry: &Entry) -> StoreResult<()> {
        self.tx
            .execute(
                "INSERT INTO entries (id, project_id, parent_id, parent_key, name, kind, content, storage_id, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    entry.id.to_string(),
                    entry.project_id.to_string(),
                    entry.parent_id.map(|p| p.to_string()),
                    parent_key(entry.parent_id),
                    entry.name,
                    entry.kind.as_str(),
                    entry.content,
                    entry.storage_id.map(|s| s.to_string()),
                    entry.updated_at.as_millis(),
                ],
            )
            .map_err(|e| match entry.storage_id {
                Some(storage_id) if is_unique_violation_on(&e, "entries.storage_id") => {
                    storage_taken(storage_id)
                }
                _ => name_conflict(e, entry.kind, &entry.name),
            })?;
        debug!(entry_id = %entry.id, kind = %entry.kind, "Inserted entry");
        Ok(())
    }

    /// Renames an entry and stamps it.
    pub fn rename_entry(&self, entry: &Entry, name: &str, now: Timestamp) -> StoreResult<()> {
        let updated = self
            .tx
            .execute(
                "UPDATE entries SET name = ?1, updated_at = ?2 WHERE id = ?3",
                params![name, now.as_millis(), entry.id.to_string()],
            )
            .map_err(|e| name_conflict(e, entry.kind, name))?;
        if updated == 0 {
            return Err(StoreError::NotFound(format!("entry {}", entry.id)));
        }
        Ok(())
    }

    /// Replaces a file's text content and stamps it.
    pub fn set_content(&self, id: EntryId, content: &str, now: Timestamp) -> StoreResult<()> {
        let updated = self.tx.execute(
            "UPDATE entries SET content = ?1, updated_at = ?2 WHERE id = ?3 AND kind = 'file'",
            params![content, now.as_millis(), id.to_string()],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(format!("file {id}")));
        }
        Ok(())
    }

    /// Deletes one entry row. Children must already be gone.
    pub fn delete_entry(&self, id: EntryId) -> StoreResult<bool> {
        let removed = self
            .tx
            .execute("DELETE FROM entries WHERE id = ?1", params![id.to_string()])?;
        Ok(removed > 0)
    }
}

fn parent_key(parent_id: Option<EntryId>) -> String {
    parent_id.map(|p| p.to_string()).unwrap_or_default()
}

pub(crate) fn storage_taken(storage_id: StorageId) -> StoreError {
    StoreError::InvalidStorage(format!("blob {storage_id} is already attached to an entry"))
}

fn name_conflict(e: rusqlite::Error, kind: EntryKind, name: &str) -> StoreError {
    if is_unique_violation(&e) {
        StoreError::DuplicateName {
            kind,
            name: name.to_string(),
        }
    } else {
        e.into()
    }
}

pub(crate) fn parse_col<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_opt_col<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
        None => Ok(None),
    }
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<Entry> {
    Ok(Entry {
        id: parse_col(row, 0)?,
        project_id: parse_col(row, 1)?,
        parent_id: parse_opt_col(row, 2)?,
        name: row.get(3)?,
        kind: parse_col(row, 4)?,
        content: row.get(5)?,
        storage_id: parse_opt_col(row, 6)?,
        updated_at: Timestamp::from_millis(row.get(7)?),
    })
}
