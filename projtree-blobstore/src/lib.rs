//! Blob storage for file entries.
//!
//! File entries may reference a binary payload by [`StorageId`]. The payloads
//! live here, outside the record store, so entry listings never drag blob
//! bytes along. The entry repository only checks for and deletes blobs, which
//! it does through the [`BlobStorage`] trait; the concrete [`BlobStore`] is a SQLite
//! table keyed by storage id with a SHA-256 content hash per blob.

mod error;

pub use error::{BlobStoreError, BlobStoreResult};

use projtree_db::{DbConfig, SharedConnection};
use projtree_types::{StorageId, Timestamp};
use rusqlite::{OptionalExtension, params};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::debug;

/// The blob operations the entry repository depends on.
pub trait BlobStorage: Send + Sync {
    /// True if the blob exists.
    fn blob_exists(&self, storage_id: &StorageId) -> BlobStoreResult<bool>;

    /// Deletes a blob. Fails with [`BlobStoreError::NotFound`] if it does
    /// not exist.
    fn delete_blob(&self, storage_id: &StorageId) -> BlobStoreResult<()>;
}

/// Metadata about a stored blob (without the payload).
#[derive(Debug, Clone, Serialize)]
pub struct BlobMetadata {
    pub storage_id: StorageId,
    pub size: i64,
    pub content_hash: Option<String>,
    pub metadata_json: Option<String>,
    pub created_at: i64,
    pub modified_at: i64,
}

/// SQLite-backed blob store.
pub struct BlobStore {
    conn: SharedConnection,
}

impl BlobStore {
    /// Opens (or creates) a blob store at `path`.
    pub fn open(path: &Path, config: &DbConfig) -> BlobStoreResult<Self> {
        let conn = if path.as_os_str() == ":memory:" {
            projtree_db::open_in_memory(config)?
        } else {
            projtree_db::open(path, config)?
        };
        Self::open_with_conn(projtree_db::share(conn))
    }

    /// Opens an in-memory blob store.
    pub fn open_in_memory() -> BlobStoreResult<Self> {
        let conn = projtree_db::open_in_memory(&DbConfig::default())?;
        Self::open_with_conn(projtree_db::share(conn))
    }

    /// Uses an existing connection, creating the table if needed.
    pub fn open_with_conn(conn: SharedConnection) -> BlobStoreResult<Self> {
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> BlobStoreResult<()> {
        let conn = projtree_db::lock(&self.conn)?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS blobs (
                storage_id TEXT PRIMARY KEY,
                data BLOB NOT NULL,
                size INTEGER NOT NULL,
                content_hash TEXT,
                metadata_json TEXT,
                created_at INTEGER NOT NULL,
                modified_at INTEGER NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Stores a new blob and returns its id.
    pub fn store(&self, data: &[u8], metadata_json: Option<&str>) -> BlobStoreResult<StorageId> {
        let storage_id = StorageId::new();
        let now = Timestamp::now().as_millis();
        let hash = hex::encode(Sha256::digest(data));
        let conn = projtree_db::lock(&self.conn)?;
        conn.execute(
            "INSERT INTO blobs (storage_id, data, size, content_hash, metadata_json, created_at, modified_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                storage_id.to_string(),
                data,
                data.len() as i64,
                hash,
                metadata_json,
                now,
            ],
        )?;
        debug!(storage_id = %storage_id, size = data.len(), "Stored blob");
        Ok(storage_id)
    }

    /// Reads a blob's payload.
    pub fn read(&self, storage_id: &StorageId) -> BlobStoreResult<Vec<u8>> {
        let conn = projtree_db::lock(&self.conn)?;
        conn.query_row(
            "SELECT data FROM blobs WHERE storage_id = ?1",
            params![storage_id.to_string()],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| BlobStoreError::NotFound(storage_id.to_string()))
    }

    /// True if the blob exists.
    pub fn exists(&self, storage_id: &StorageId) -> BlobStoreResult<bool> {
        let conn = projtree_db::lock(&self.conn)?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM blobs WHERE storage_id = ?1",
            params![storage_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Deletes a blob.
    pub fn delete(&self, storage_id: &StorageId) -> BlobStoreResult<()> {
        let conn = projtree_db::lock(&self.conn)?;
        let removed = conn.execute(
            "DELETE FROM blobs WHERE storage_id = ?1",
            params![storage_id.to_string()],
        )?;
        if removed == 0 {
            return Err(BlobStoreError::NotFound(storage_id.to_string()));
        }
        debug!(storage_id = %storage_id, "Deleted blob");
        Ok(())
    }

    /// Replaces a blob's metadata.
    pub fn update_metadata(&self, storage_id: &StorageId, metadata_json: &str) -> BlobStoreResult<()> {
        let conn = projtree_db::lock(&self.conn)?;
        let updated = conn.execute(
            "UPDATE blobs SET metadata_json = ?1, modified_at = ?2 WHERE storage_id = ?3",
            params![metadata_json, Timestamp::now().as_millis(), storage_id.to_string()],
        )?;
        if updated == 0 {
            return Err(BlobStoreError::NotFound(storage_id.to_string()));
        }
        Ok(())
    }

    /// Lists metadata for every stored blob, oldest first.
    pub fn list(&self) -> BlobStoreResult<Vec<BlobMetadata>> {
        let conn = projtree_db::lock(&self.conn)?;
        let mut stmt = conn.prepare(
            "SELECT storage_id, size, content_hash, metadata_json, created_at, modified_at
             FROM blobs ORDER BY storage_id",
        )?;
        let rows = stmt.query_map([], |row| {
            let id: String = row.get(0)?;
            Ok((
                id,
                row.get::<_, i64>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, i64>(5)?,
            ))
        })?;

        let mut result = Vec::new();
        for row in rows {
            let (id, size, content_hash, metadata_json, created_at, modified_at) = row?;
            let storage_id = StorageId::parse(&id)
                .map_err(|e| BlobStoreError::Storage(format!("invalid storage_id {id}: {e}")))?;
            result.push(BlobMetadata {
                storage_id,
                size,
                content_hash,
                metadata_json,
                created_at,
                modified_at,
            });
        }
        Ok(result)
    }
}

impl BlobStorage for BlobStore {
    fn blob_exists(&self, storage_id: &StorageId) -> BlobStoreResult<bool> {
        self.exists(storage_id)
    }

    fn delete_blob(&self, storage_id: &StorageId) -> BlobStoreResult<()> {
        self.delete(storage_id)
    }
}
