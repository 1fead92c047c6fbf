//! Shared test helpers for repository tests.

#![allow(dead_code)]

use projtree_blobstore::{BlobStorage, BlobStore, BlobStoreError, BlobStoreResult};
use projtree_store::{EntryRepository, NewFile, NewFolder, RecordStore, RequestContext};
use projtree_types::{Entry, EntryId, ManualClock, Project, ProjectId, StorageId, SubjectId, Timestamp};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

pub const START: Timestamp = Timestamp::from_millis(1_700_000_000_000);

/// Blob store wrapper that records deletes and can be told to fail.
pub struct FlakyBlobs {
    pub inner: BlobStore,
    pub deletes: Mutex<Vec<StorageId>>,
    failing: Mutex<HashSet<StorageId>>,
}

impl FlakyBlobs {
    pub fn new() -> Self {
        Self {
            inner: BlobStore::open_in_memory().unwrap(),
            deletes: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
        }
    }

    pub fn fail_on(&self, id: StorageId) {
        self.failing.lock().unwrap().insert(id);
    }

    pub fn heal(&self) {
        self.failing.lock().unwrap().clear();
    }

    pub fn delete_count(&self, id: &StorageId) -> usize {
        self.deletes.lock().unwrap().iter().filter(|d| *d == id).count()
    }

    pub fn exists(&self, id: &StorageId) -> bool {
        self.inner.exists(id).unwrap()
    }
}

impl BlobStorage for FlakyBlobs {
    fn blob_exists(&self, storage_id: &StorageId) -> BlobStoreResult<bool> {
        self.inner.exists(storage_id)
    }

    fn delete_blob(&self, storage_id: &StorageId) -> BlobStoreResult<()> {
        if self.failing.lock().unwrap().contains(storage_id) {
            return Err(BlobStoreError::Storage("injected failure".to_string()));
        }
        self.inner.delete(storage_id)?;
        self.deletes.lock().unwrap().push(*storage_id);
        Ok(())
    }
}

pub struct Fixture {
    pub repo: EntryRepository,
    pub blobs: Arc<FlakyBlobs>,
    pub clock: Arc<ManualClock>,
    pub owner: RequestContext,
    pub project: Project,
}

impl Fixture {
    pub fn new() -> Self {
        let records = RecordStore::open_in_memory().unwrap();
        Self::with_records(records)
    }

    pub fn with_records(records: RecordStore) -> Self {
        let blobs = Arc::new(FlakyBlobs::new());
        let clock = Arc::new(ManualClock::new(START));
        let repo = EntryRepository::new(records, blobs.clone()).with_clock(clock.clone());
        let owner_id = subject("alice");
        let project = repo.records().register_project(&owner_id, START).unwrap();
        Self {
            repo,
            blobs,
            clock,
            owner: RequestContext::for_subject(owner_id),
            project,
        }
    }

    pub fn pid(&self) -> ProjectId {
        self.project.id
    }

    pub fn folder(&self, parent: Option<EntryId>, name: &str) -> Entry {
        self.repo
            .create_folder(
                &self.owner,
                NewFolder {
                    project_id: self.pid(),
                    parent_id: parent,
                    name: name.to_string(),
                },
            )
            .unwrap()
    }

    pub fn file(&self, parent: Option<EntryId>, name: &str) -> Entry {
        self.repo.create_file(&self.owner, new_file(self.pid(), parent, name)).unwrap()
    }

    /// Creates a file with a freshly stored blob attached.
    pub fn file_with_blob(&self, parent: Option<EntryId>, name: &str) -> (Entry, StorageId) {
        let storage_id = self.blobs.inner.store(name.as_bytes(), None).unwrap();
        let mut new = new_file(self.pid(), parent, name);
        new.storage_id = Some(storage_id);
        (self.repo.create_file(&self.owner, new).unwrap(), storage_id)
    }

    pub fn project_updated_at(&self) -> Timestamp {
        self.repo.records().get_project(self.pid()).unwrap().updated_at
    }

    pub fn names(&self, parent: Option<EntryId>) -> Vec<String> {
        self.repo
            .list_children(&self.owner, self.pid(), parent)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect()
    }
}

pub fn subject(s: &str) -> SubjectId {
    SubjectId::new(s).unwrap()
}

pub fn new_file(project_id: ProjectId, parent_id: Option<EntryId>, name: &str) -> NewFile {
    NewFile {
        project_id,
        parent_id,
        name: name.to_string(),
        content: String::new(),
        storage_id: None,
    }
}

pub fn new_folder(project_id: ProjectId, parent_id: Option<EntryId>, name: &str) -> NewFolder {
    NewFolder {
        project_id,
        parent_id,
        name: name.to_string(),
    }
}
