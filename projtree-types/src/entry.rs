//! Entry and project records.
//!
//! An entry is either a file or a folder belonging to exactly one project.
//! Entries form a forest: root-level entries have no parent, every other
//! entry hangs off a folder in the same project.

use crate::{EntryId, ProjectId, StorageId, SubjectId, Timestamp, TypesError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest accepted entry name, in bytes.
pub const MAX_NAME_LEN: usize = 255;

/// Whether an entry is a file or a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Folder,
}

impl EntryKind {
    /// Returns the stored representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Folder => "folder",
        }
    }

    /// Position within a sibling listing: folders sort before files.
    #[must_use]
    pub const fn listing_rank(&self) -> u8 {
        match self {
            Self::Folder => 0,
            Self::File => 1,
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(Self::File),
            "folder" => Ok(Self::Folder),
            other => Err(TypesError::InvalidKind(other.to_string())),
        }
    }
}

/// A file or folder in a project's tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: EntryId,
    pub project_id: ProjectId,
    /// Parent folder, or `None` for a root-level entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<EntryId>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Text content. Always `None` for folders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Attached blob. Always `None` for folders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_id: Option<StorageId>,
    pub updated_at: Timestamp,
}

impl Entry {
    /// Builds a new file entry with a fresh id.
    #[must_use]
    pub fn file(
        project_id: ProjectId,
        parent_id: Option<EntryId>,
        name: impl Into<String>,
        content: impl Into<String>,
        storage_id: Option<StorageId>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: EntryId::new(),
            project_id,
            parent_id,
            name: name.into(),
            kind: EntryKind::File,
            content: Some(content.into()),
            storage_id,
            updated_at: now,
        }
    }

    /// Builds a new folder entry with a fresh id.
    #[must_use]
    pub fn folder(
        project_id: ProjectId,
        parent_id: Option<EntryId>,
        name: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: EntryId::new(),
            project_id,
            parent_id,
            name: name.into(),
            kind: EntryKind::Folder,
            content: None,
            storage_id: None,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    #[must_use]
    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }

    /// True if a sibling of kind `kind` named `name` would collide with this
    /// entry. Only same-kind entries collide.
    #[must_use]
    pub fn collides_with(&self, kind: EntryKind, name: &str) -> bool {
        self.kind == kind && self.name == name
    }
}

/// A project record, owned by the project registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub owner_id: SubjectId,
    pub updated_at: Timestamp,
}

impl Project {
    /// True if `subject` owns this project.
    #[must_use]
    pub fn is_owned_by(&self, subject: &SubjectId) -> bool {
        &self.owner_id == subject
    }
}

/// Checks that `name` is usable as an entry name.
///
/// Names are opaque labels, not paths: separators and control characters
/// are rejected rather than interpreted.
pub fn validate_name(name: &str) -> Result<(), TypesError> {
    if name.trim().is_empty() {
        return Err(TypesError::InvalidName("name must not be empty".to_string()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(TypesError::InvalidName(format!(
            "name exceeds {MAX_NAME_LEN} bytes"
        )));
    }
    if let Some(c) = name
        .chars()
        .find(|c| *c == '/' || *c == '\\' || c.is_control())
    {
        return Err(TypesError::InvalidName(format!(
            "name contains forbidden character {c:?}"
        )));
    }
    Ok(())
}
