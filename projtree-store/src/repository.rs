//! The entry repository: every operation on a project's tree.
//!
//! Each operation resolves the caller, then runs one transaction that checks
//! ownership, validates, mutates and touches the project. Mutations stamp the
//! entry and the project with the same timestamp, taken from the injected
//! [`Clock`] and clamped so the project's `updated_at` never goes backwards.

use crate::cascade::CascadePlan;
use crate::gate::AuthorizationGate;
use crate::identity::{ContextIdentityResolver, IdentityResolver, RequestContext};
use crate::records::{RecordStore, RecordTx, storage_taken};
use crate::registry::ProjectRegistry;
use crate::{StoreError, StoreResult};
use projtree_blobstore::{BlobStorage, BlobStoreError};
use projtree_types::{
    Clock, Entry, EntryId, EntryKind, Project, ProjectId, SiblingKey, StorageId, SubjectId,
    SystemClock, Timestamp, sort_siblings, validate_name,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Request to create a file.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub project_id: ProjectId,
    pub parent_id: Option<EntryId>,
    pub name: String,
    pub content: String,
    /// Blob uploaded beforehand, deleted along with the file. It must
    /// exist and must not back any other entry.
    pub storage_id: Option<StorageId>,
}

/// Request to create a folder.
#[derive(Debug, Clone)]
pub struct NewFolder {
    pub project_id: ProjectId,
    pub parent_id: Option<EntryId>,
    pub name: String,
}

/// File and folder operations scoped to projects.
#[derive(Clone)]
pub struct EntryRepository {
    records: RecordStore,
    blobs: Arc<dyn BlobStorage>,
    gate: AuthorizationGate,
    clock: Arc<dyn Clock>,
}

impl EntryRepository {
    /// Creates a repository that trusts the subject on the request context
    /// and reads the system clock.
    pub fn new(records: RecordStore, blobs: Arc<dyn BlobStorage>) -> Self {
        Self {
            records,
            blobs,
            gate: AuthorizationGate::new(Arc::new(ContextIdentityResolver)),
            clock: Arc::new(SystemClock),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_identity_resolver(mut self, resolver: Arc<dyn IdentityResolver>) -> Self {
        self.gate = AuthorizationGate::new(resolver);
        self
    }

    /// The underlying record store.
    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    /// Creates an empty project owned by the caller.
    pub fn register_project(&self, ctx: &RequestContext) -> StoreResult<Project> {
        let subject = self.gate.identify(ctx)?;
        self.records.register_project(&subject, self.clock.now())
    }

    // ── Authorization ───────────────────────────────────────────

    /// Checks that the caller owns `project_id` and returns the caller.
    pub fn authorize(&self, ctx: &RequestContext, project_id: ProjectId) -> StoreResult<SubjectId> {
        let subject = self.gate.identify(ctx)?;
        self.records
            .read(|tx| self.gate.authorize(tx, &subject, project_id))?;
        Ok(subject)
    }

    /// Checks that the caller owns the project holding `entry_id`.
    pub fn authorize_by_entry(
        &self,
        ctx: &RequestContext,
        entry_id: EntryId,
    ) -> StoreResult<(SubjectId, Entry, Project)> {
        let subject = self.gate.identify(ctx)?;
        let (entry, project) = self
            .records
            .read(|tx| self.gate.authorize_entry(tx, &subject, entry_id))?;
        Ok((subject, entry, project))
    }

    // ── Reads ───────────────────────────────────────────────────

    /// Root-level entries of a project, folders first.
    pub fn list_root(&self, ctx: &RequestContext, project_id: ProjectId) -> StoreResult<Vec<Entry>> {
        self.list_children(ctx, project_id, None)
    }

    /// Direct children of `parent_id` (root entries for `None`), folders
    /// first, then by name.
    pub fn list_children(
        &self,
        ctx: &RequestContext,
        project_id: ProjectId,
        parent_id: Option<EntryId>,
    ) -> StoreResult<Vec<Entry>> {
        let subject = self.gate.identify(ctx)?;
        self.records.read(|tx| {
            self.gate.authorize(tx, &subject, project_id)?;
            if let Some(parent_id) = parent_id {
                load_parent(tx, project_id, parent_id)?;
            }
            let mut children = tx.children(project_id, parent_id)?;
            sort_siblings(&mut children);
            Ok(children)
        })
    }

    /// Every entry of a project, grouped by parent (root first), each group
    /// in listing order.
    pub fn list_project(&self, ctx: &RequestContext, project_id: ProjectId) -> StoreResult<Vec<Entry>> {
        let subject = self.gate.identify(ctx)?;
        self.records.read(|tx| {
            self.gate.authorize(tx, &subject, project_id)?;
            let mut entries = tx.project_entries(project_id)?;
            entries.sort_by_cached_key(|e| (e.parent_id, SiblingKey::of(e)));
            Ok(entries)
        })
    }

    /// A single entry.
    pub fn get_entry(&self, ctx: &RequestContext, id: EntryId) -> StoreResult<Entry> {
        let subject = self.gate.identify(ctx)?;
        self.records
            .read(|tx| self.gate.authorize_entry(tx, &subject, id))
            .map(|(entry, _)| entry)
    }

    // ── Creation ────────────────────────────────────────────────

    pub fn create_file(&self, ctx: &RequestContext, new: NewFile) -> StoreResult<Entry> {
        let NewFile {
            project_id,
            parent_id,
            name,
            content,
            storage_id,
        } = new;
        let target = Target {
            project_id,
            parent_id,
            kind: EntryKind::File,
            storage_id,
        };
        self.create(ctx, target, name, |name, now| {
            Entry::file(project_id, parent_id, name, content, storage_id, now)
        })
    }

    pub fn create_folder(&self, ctx: &RequestContext, new: NewFolder) -> StoreResult<Entry> {
        let NewFolder {
            project_id,
            parent_id,
            name,
        } = new;
        let target = Target {
            project_id,
            parent_id,
            kind: EntryKind::Folder,
            storage_id: None,
        };
        self.create(ctx, target, name, |name, now| {
            Entry::folder(project_id, parent_id, name, now)
        })
    }

    fn create(
        &self,
        ctx: &RequestContext,
        target: Target,
        name: String,
        build: impl FnOnce(String, Timestamp) -> Entry,
    ) -> StoreResult<Entry> {
        let Target {
            project_id,
            parent_id,
            kind,
            storage_id,
        } = target;
        let subject = self.gate.identify(ctx)?;
        let entry = self.records.transaction(|tx| {
            let project = self.gate.authorize(tx, &subject, project_id)?;
            validate_name(&name)?;
            if let Some(parent_id) = parent_id {
                let parent = load_parent(tx, project_id, parent_id)?;
                if !parent.is_folder() {
                    return Err(StoreError::InvalidParent(format!(
                        "{parent_id} is a file"
                    )));
                }
            }

            let siblings = tx.children(project_id, parent_id)?;
            if siblings.iter().any(|s| s.collides_with(kind, &name)) {
                return Err(StoreError::DuplicateName { kind, name });
            }
            if let Some(storage_id) = storage_id {
                self.check_blob(tx, storage_id)?;
            }

            let now = self.stamp(&project);
            let entry = build(name, now);
            tx.insert_entry(&entry)?;
            tx.touch_project(project_id, now)?;
            Ok(entry)
        })?;
        info!(
            project_id = %project_id,
            entry_id = %entry.id,
            kind = %entry.kind,
            request_id = ?ctx.request_id,
            "Created entry"
        );
        Ok(entry)
    }

    // ── Mutation ────────────────────────────────────────────────

    /// Renames an entry. Only a sibling of the same kind blocks the name.
    pub fn rename_entry(&self, ctx: &RequestContext, id: EntryId, new_name: &str) -> StoreResult<()> {
        let subject = self.gate.identify(ctx)?;
        self.records.transaction(|tx| {
            let (entry, project) = self.gate.authorize_entry(tx, &subject, id)?;
            validate_name(new_name)?;

            let siblings = tx.children(entry.project_id, entry.parent_id)?;
            if siblings
                .iter()
                .any(|s| s.id != entry.id && s.collides_with(entry.kind, new_name))
            {
                return Err(StoreError::DuplicateName {
                    kind: entry.kind,
                    name: new_name.to_string(),
                });
            }

            let now = self.stamp(&project);
            tx.rename_entry(&entry, new_name, now)?;
            tx.touch_project(project.id, now)
        })?;
        info!(entry_id = %id, request_id = ?ctx.request_id, "Renamed entry");
        Ok(())
    }

    /// Replaces a file's text content. Folders are rejected.
    pub fn update_content(&self, ctx: &RequestContext, id: EntryId, content: &str) -> StoreResult<()> {
        let subject = self.gate.identify(ctx)?;
        self.records.transaction(|tx| {
            let (entry, project) = self.gate.authorize_entry(tx, &subject, id)?;
            if !entry.is_file() {
                return Err(StoreError::NotAFile(id));
            }
            let now = self.stamp(&project);
            tx.set_content(id, content, now)?;
            tx.touch_project(project.id, now)
        })?;
        debug!(entry_id = %id, bytes = content.len(), "Updated content");
        Ok(())
    }

    /// Deletes an entry, its whole subtree and every blob the subtree's
    /// files reference.
    ///
    /// Records are removed children-first in one transaction. If a blob
    /// delete fails the transaction rolls back and
    /// [`StoreError::BlobDeleteFailed`] reports which blobs were already
    /// gone; a blob that is missing counts as deleted, so the call can simply
    /// be retried.
    ///
    /// Blob deletes are not transactional. They run before the commit, so if
    /// the commit itself fails the records survive while their blobs are
    /// already gone. Such entries keep a dangling `storage_id` until the
    /// delete is retried.
    pub fn delete_entry(&self, ctx: &RequestContext, id: EntryId) -> StoreResult<()> {
        let subject = self.gate.identify(ctx)?;
        let (removed, blobs) = self.records.transaction(|tx| {
            let (entry, project) = self.gate.authorize_entry(tx, &subject, id)?;
            let plan = CascadePlan::build(entry, |node| tx.children(node.project_id, Some(node.id)))?;

            for node in plan.post_order() {
                debug!(entry_id = %node.id, kind = %node.kind, "Deleting entry");
                if !tx.delete_entry(node.id)? {
                    return Err(StoreError::NotFound(format!("entry {}", node.id)));
                }
            }

            let storage_ids = plan.storage_ids();
            let mut deleted = Vec::with_capacity(storage_ids.len());
            for storage_id in storage_ids {
                match self.blobs.delete_blob(&storage_id) {
                    Ok(()) => {}
                    Err(BlobStoreError::NotFound(_)) => {
                        debug!(storage_id = %storage_id, "Blob already gone");
                    }
                    Err(source) => {
                        warn!(
                            entry_id = %id,
                            storage_id = %storage_id,
                            already_deleted = deleted.len(),
                            error = %source,
                            "Blob delete failed, rolling back"
                        );
                        return Err(StoreError::BlobDeleteFailed {
                            storage_id,
                            already_deleted: deleted,
                            source,
                        });
                    }
                }
                deleted.push(storage_id);
            }

            tx.touch_project(project.id, self.stamp(&project))?;
            Ok((plan.len(), deleted.len()))
        })?;
        info!(
            entry_id = %id,
            entries = removed,
            blobs,
            request_id = ?ctx.request_id,
            "Deleted entry"
        );
        Ok(())
    }

    /// A new file may only take a blob that exists and is not yet attached.
    fn check_blob(&self, tx: &RecordTx<'_>, storage_id: StorageId) -> StoreResult<()> {
        if tx.storage_in_use(storage_id)? {
            return Err(storage_taken(storage_id));
        }
        let exists = self
            .blobs
            .blob_exists(&storage_id)
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        if !exists {
            return Err(StoreError::InvalidStorage(format!("unknown blob {storage_id}")));
        }
        Ok(())
    }

    fn stamp(&self, project: &Project) -> Timestamp {
        self.clock.now().max(project.updated_at)
    }
}

/// Where a new entry goes.
struct Target {
    project_id: ProjectId,
    parent_id: Option<EntryId>,
    kind: EntryKind,
    storage_id: Option<StorageId>,
}

/// Loads a parent entry, hiding entries of other projects.
fn load_parent(tx: &RecordTx<'_>, project_id: ProjectId, parent_id: EntryId) -> StoreResult<Entry> {
    tx.entry(parent_id)?
        .filter(|parent| parent.project_id == project_id)
        .ok_or_else(|| StoreError::NotFound(format!("parent entry {parent_id}")))
}
