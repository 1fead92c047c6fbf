//! Error types for the entry store.

use projtree_blobstore::BlobStoreError;
use projtree_db::DbError;
use projtree_types::{EntryId, EntryKind, ProjectId, StorageId, TypesError};
use rusqlite::ErrorCode;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
///
/// Every variant is scoped to the single request that produced it.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No identity could be resolved from the request.
    #[error("unauthenticated")]
    Unauthenticated,

    /// The caller is authenticated but does not own the project.
    #[error("access to project {project_id} denied")]
    Forbidden { project_id: ProjectId },

    /// Project or entry absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// A sibling of the same kind already uses the name.
    #[error("a {kind} named {name:?} already exists in this folder")]
    DuplicateName { kind: EntryKind, name: String },

    /// Another writer held the database past the busy timeout.
    #[error("transaction conflict, retry the operation")]
    TransactionConflict,

    /// A blob delete failed during a cascading delete. The record deletions
    /// were rolled back; `already_deleted` lists blobs removed before the
    /// failure.
    #[error("failed to delete blob {storage_id}: {source}")]
    BlobDeleteFailed {
        storage_id: StorageId,
        already_deleted: Vec<StorageId>,
        #[source]
        source: BlobStoreError,
    },

    /// Entry name rejected by validation.
    #[error("invalid entry name: {0}")]
    InvalidName(String),

    /// Parent exists but cannot hold children.
    #[error("invalid parent: {0}")]
    InvalidParent(String),

    /// The blob does not exist or is already attached to another entry.
    #[error("invalid storage reference: {0}")]
    InvalidStorage(String),

    /// Content updates only apply to files.
    #[error("entry {0} is a folder, not a file")]
    NotAFile(EntryId),

    /// Database or row decoding failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl StoreError {
    /// Short machine-readable name of the variant.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden { .. } => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::DuplicateName { .. } => "duplicate_name",
            Self::TransactionConflict => "transaction_conflict",
            Self::BlobDeleteFailed { .. } => "blob_delete_failed",
            Self::InvalidName(_) => "invalid_name",
            Self::InvalidParent(_) => "invalid_parent",
            Self::InvalidStorage(_) => "invalid_storage",
            Self::NotAFile(_) => "not_a_file",
            Self::Storage(_) => "storage",
        }
    }
}

/// True if the error is a unique-index violation.
pub(crate) fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// True if the error is a unique-index violation naming `column`, as in
/// `UNIQUE constraint failed: entries.storage_id`.
pub(crate) fn is_unique_violation_on(e: &rusqlite::Error, column: &str) -> bool {
    is_unique_violation(e)
        && matches!(e, rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains(column))
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        match e.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => Self::TransactionConflict,
            _ => Self::Storage(e.to_string()),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Sqlite(inner) => inner.into(),
            DbError::Poisoned => Self::Storage(e.to_string()),
        }
    }
}

impl From<TypesError> for StoreError {
    fn from(e: TypesError) -> Self {
        match e {
            TypesError::InvalidName(msg) => Self::InvalidName(msg),
            other => Self::Storage(other.to_string()),
        }
    }
}
