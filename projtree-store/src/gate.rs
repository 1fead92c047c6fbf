//! Authorization gate: only a project's owner may touch its entries.
//!
//! Identity is resolved once per request, before a transaction opens. The
//! ownership check itself runs inside the operation's transaction, so the
//! owner it saw is the owner the mutation commits against.

use crate::identity::{IdentityResolver, RequestContext};
use crate::records::RecordTx;
use crate::registry::ProjectRegistry;
use crate::{StoreError, StoreResult};
use projtree_types::{Entry, EntryId, Project, ProjectId, SubjectId};
use std::sync::Arc;
use tracing::warn;

/// Identity resolution plus project ownership checks.
#[derive(Clone)]
pub struct AuthorizationGate {
    resolver: Arc<dyn IdentityResolver>,
}

impl AuthorizationGate {
    pub fn new(resolver: Arc<dyn IdentityResolver>) -> Self {
        Self { resolver }
    }

    /// Resolves the caller, failing with [`StoreError::Unauthenticated`].
    pub fn identify(&self, ctx: &RequestContext) -> StoreResult<SubjectId> {
        self.resolver.resolve_identity(ctx).inspect_err(|_| {
            warn!(request_id = ?ctx.request_id, "Rejected unauthenticated request");
        })
    }

    /// Loads the project and checks that `subject` owns it.
    pub fn authorize(&self, tx: &RecordTx<'_>, subject: &SubjectId, project_id: ProjectId) -> StoreResult<Project> {
        let project = tx.get_project(project_id)?;
        if !project.is_owned_by(subject) {
            warn!(project_id = %project_id, subject = %subject, "Forbidden project access");
            return Err(StoreError::Forbidden { project_id });
        }
        Ok(project)
    }

    /// Loads the entry and its project and checks that `subject` owns it.
    pub fn authorize_entry(
        &self,
        tx: &RecordTx<'_>,
        subject: &SubjectId,
        entry_id: EntryId,
    ) -> StoreResult<(Entry, Project)> {
        let entry = tx
            .entry(entry_id)?
            .ok_or_else(|| StoreError::NotFound(format!("entry {entry_id}")))?;
        let project = self.authorize(tx, subject, entry.project_id)?;
        Ok((entry, project))
    }
}
