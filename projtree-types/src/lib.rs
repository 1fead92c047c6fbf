//! Core type definitions for projtree.
//!
//! This crate defines the plain data shared by every other crate:
//! - Entry, project, blob and subject identifiers (UUID v7 / opaque subject)
//! - Millisecond timestamps and the injectable [`Clock`]
//! - The [`Entry`] and [`Project`] records and entry-name validation
//! - The sibling ordering used by directory listings
//!
//! Nothing here touches storage; persistence lives in `projtree-store`.

mod entry;
mod ids;
mod ordering;
mod timestamp;

pub use entry::{Entry, EntryKind, MAX_NAME_LEN, Project, validate_name};
pub use ids::{EntryId, ProjectId, StorageId, SubjectId};
pub use ordering::{SiblingKey, compare_siblings, sort_siblings};
pub use timestamp::{Clock, ManualClock, SystemClock, Timestamp};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, TypesError>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum TypesError {
    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid entry name: {0}")]
    InvalidName(String),

    #[error("invalid entry kind: {0}")]
    InvalidKind(String),
}
