//! Project registry.
//!
//! Projects are created and owned elsewhere; the entry store only needs to
//! look them up for ownership checks and bump their `updated_at` after a
//! mutation. Both happen inside the caller's transaction so the touch commits
//! or rolls back together with the entry change.

use crate::records::{RecordStore, RecordTx, parse_col};
use crate::{StoreError, StoreResult};
use projtree_types::{Project, ProjectId, SubjectId, Timestamp};
use rusqlite::{OptionalExtension, params};
use tracing::info;

/// Project lookups the repository relies on.
pub trait ProjectRegistry {
    /// Loads a project, failing with [`StoreError::NotFound`] if absent.
    fn get_project(&self, id: ProjectId) -> StoreResult<Project>;

    /// Raises the project's `updated_at` to `at`. Never moves it backwards.
    fn touch_project(&self, id: ProjectId, at: Timestamp) -> StoreResult<()>;
}

impl ProjectRegistry for RecordTx<'_> {
    fn get_project(&self, id: ProjectId) -> StoreResult<Project> {
        self.tx
            .query_row(
                "SELECT id, owner_id, updated_at FROM projects WHERE id = ?1",
                params![id.to_string()],
                |row| {
                    let owner: String = row.get(1)?;
                    Ok((parse_col::<ProjectId>(row, 0)?, owner, row.get::<_, i64>(2)?))
                },
            )
            .optional()?
            .and_then(|(id, owner, updated_at)| {
                Some(Project {
                    id,
                    owner_id: SubjectId::new(owner)?,
                    updated_at: Timestamp::from_millis(updated_at),
                })
            })
            .ok_or_else(|| StoreError::NotFound(format!("project {id}")))
    }

    fn touch_project(&self, id: ProjectId, at: Timestamp) -> StoreResult<()> {
        let updated = self.tx.execute(
            "UPDATE projects SET updated_at = MAX(updated_at, ?1) WHERE id = ?2",
            params![at.as_millis(), id.to_string()],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(format!("project {id}")));
        }
        Ok(())
    }
}

impl RecordStore {
    /// Creates a project owned by `owner`.
    pub fn register_project(&self, owner: &SubjectId, now: Timestamp) -> StoreResult<Project> {
        let project = Project {
            id: ProjectId::new(),
            owner_id: owner.clone(),
            updated_at: now,
        };
        self.transaction(|tx| {
            tx.tx.execute(
                "INSERT INTO projects (id, owner_id, updated_at) VALUES (?1, ?2, ?3)",
                params![
                    project.id.to_string(),
                    project.owner_id.as_str(),
                    project.updated_at.as_millis(),
                ],
            )?;
            Ok(())
        })?;
        info!(project_id = %project.id, owner = %project.owner_id, "Registered project");
        Ok(project)
    }

    /// Loads a project outside any caller transaction.
    pub fn get_project(&self, id: ProjectId) -> StoreResult<Project> {
        self.read(|tx| tx.get_project(id))
    }
}
