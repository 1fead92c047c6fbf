use thiserror::Error;

/// Result type for blob store operations.
pub type BlobStoreResult<T> = Result<T, BlobStoreError>;

/// Errors that can occur in blob store operations.
#[derive(Debug, Error)]
pub enum BlobStoreError {
    /// No blob with this id.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// The backing store failed.
    #[error("blob storage error: {0}")]
    Storage(String),
}

impl From<rusqlite::Error> for BlobStoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<projtree_db::DbError> for BlobStoreError {
    fn from(e: projtree_db::DbError) -> Self {
        Self::Storage(e.to_string())
    }
}
