mod common;

use common::{Fixture, new_file, new_folder};
use proptest::prelude::*;
use projtree_types::{Entry, EntryId, EntryKind};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
enum Op {
    Create { folder: bool, parent: usize, name: usize },
    Rename { target: usize, name: usize },
    Delete { target: usize },
}

const NAMES: &[&str] = &["a", "b", "A", "main.go", "src"];

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (any::<bool>(), 0usize..16, 0..NAMES.len())
            .prop_map(|(folder, parent, name)| Op::Create { folder, parent, name }),
        2 => (0usize..16, 0..NAMES.len()).prop_map(|(target, name)| Op::Rename { target, name }),
        1 => (0usize..16).prop_map(|target| Op::Delete { target }),
    ]
}

fn pick(ids: &[EntryId], slot: usize) -> Option<EntryId> {
    if ids.is_empty() || slot == 0 {
        None
    } else {
        Some(ids[slot % ids.len()])
    }
}

fn check_tree(entries: &[Entry]) {
    let by_id: HashMap<EntryId, &Entry> = entries.iter().map(|e| (e.id, e)).collect();
    let mut seen: HashSet<(Option<EntryId>, EntryKind, &str)> = HashSet::new();
    for entry in entries {
        assert!(
            seen.insert((entry.parent_id, entry.kind, entry.name.as_str())),
            "duplicate sibling {:?} {:?}",
            entry.kind,
            entry.name
        );
        if let Some(parent) = entry.parent_id {
            let parent = by_id.get(&parent).expect("dangling parent");
            assert!(parent.is_folder());
        }
        if entry.is_folder() {
            assert!(entry.content.is_none());
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn tree_stays_consistent(ops in prop::collection::vec(arb_op(), 1..40)) {
        let fx = Fixture::new();
        let pid = fx.pid();

        for op in ops {
            let all = fx.repo.list_project(&fx.owner, pid).unwrap();
            let folders: Vec<EntryId> = all.iter().filter(|e| e.is_folder()).map(|e| e.id).collect();
            let ids: Vec<EntryId> = all.iter().map(|e| e.id).collect();

            match op {
                Op::Create { folder, parent, name } => {
                    let parent = pick(&folders, parent);
                    let _ = if folder {
                        fx.repo.create_folder(&fx.owner, new_folder(pid, parent, NAMES[name]))
                    } else {
                        fx.repo.create_file(&fx.owner, new_file(pid, parent, NAMES[name]))
                    };
                }
                Op::Rename { target, name } => {
                    if let Some(id) = pick(&ids, target + 1) {
                        let _ = fx.repo.rename_entry(&fx.owner, id, NAMES[name]);
                    }
                }
                Op::Delete { target } => {
                    if let Some(id) = pick(&ids, target + 1) {
                        fx.repo.delete_entry(&fx.owner, id).unwrap();
                    }
                }
            }

            check_tree(&fx.repo.list_project(&fx.owner, pid).unwrap());
        }
    }

    #[test]
    fn create_rejects_exactly_the_same_kind_duplicates(
        names in prop::collection::vec((any::<bool>(), 0..NAMES.len()), 1..20)
    ) {
        let fx = Fixture::new();
        let mut taken: HashSet<(bool, usize)> = HashSet::new();
        for (folder, name) in names {
            let result = if folder {
                fx.repo.create_folder(&fx.owner, new_folder(fx.pid(), None, NAMES[name]))
            } else {
                fx.repo.create_file(&fx.owner, new_file(fx.pid(), None, NAMES[name]))
            };
            prop_assert_eq!(result.is_ok(), taken.insert((folder, name)));
        }
        prop_assert_eq!(fx.names(None).len(), taken.len());
    }
}
