//! Planning for recursive deletes.
//!
//! A [`CascadePlan`] is an arena holding a subtree, loaded breadth-first
//! through a caller-supplied child lookup. Nothing here touches storage, so
//! the traversal can be exercised with an in-memory tree.

use crate::{StoreError, StoreResult};
use projtree_types::{Entry, EntryId, StorageId, sort_siblings};
use std::collections::{HashSet, VecDeque};

struct PlanNode {
    entry: Entry,
    children: Vec<usize>,
}

/// The subtree under one entry, root included.
pub struct CascadePlan {
    // nodes[0] is the root
    nodes: Vec<PlanNode>,
}

impl CascadePlan {
    /// Loads the subtree rooted at `root`. `children_of` is only called for
    /// folders.
    ///
    /// Fails if an entry is reached twice, which would mean the stored
    /// parent links are not a tree.
    pub fn build<F>(root: Entry, mut children_of: F) -> StoreResult<Self>
    where
        F: FnMut(&Entry) -> StoreResult<Vec<Entry>>,
    {
        let mut seen: HashSet<EntryId> = HashSet::from([root.id]);
        let mut nodes = vec![PlanNode {
            entry: root,
            children: Vec::new(),
        }];
        let mut queue = VecDeque::from([0usize]);

        while let Some(idx) = queue.pop_front() {
            if !nodes[idx].entry.is_folder() {
                continue;
            }
            let mut children = children_of(&nodes[idx].entry)?;
            sort_siblings(&mut children);
            for child in children {
                if !seen.insert(child.id) {
                    return Err(StoreError::Storage(format!(
                        "entry {} reached twice while planning delete",
                        child.id
                    )));
                }
                let child_idx = nodes.len();
                nodes.push(PlanNode {
                    entry: child,
                    children: Vec::new(),
                });
                nodes[idx].children.push(child_idx);
                queue.push_back(child_idx);
            }
        }

        Ok(Self { nodes })
    }

    /// The entry the delete was requested for.
    #[must_use]
    pub fn root(&self) -> &Entry {
        &self.nodes[0].entry
    }

    /// Number of entries in the subtree, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a plan holds at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Entries with every child before its parent; the root comes last.
    #[must_use]
    pub fn post_order(&self) -> Vec<&Entry> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(0usize, false)];
        while let Some((idx, expanded)) = stack.pop() {
            if expanded {
                out.push(&self.nodes[idx].entry);
                continue;
            }
            stack.push((idx, true));
            for &child in self.nodes[idx].children.iter().rev() {
                stack.push((child, false));
            }
        }
        out
    }

    /// Blob ids of every file in the subtree, in post-order, each once.
    #[must_use]
    pub fn storage_ids(&self) -> Vec<StorageId> {
        let mut seen = HashSet::new();
        self.post_order()
            .into_iter()
            .filter_map(|entry| entry.storage_id)
            .filter(|id| seen.insert(*id))
            .collect()
    }
}
