mod common;

use common::Fixture;
use pretty_assertions::assert_eq;
use projtree_types::EntryKind;

#[test]
fn empty_project_lists_nothing() {
    let fx = Fixture::new();
    assert!(fx.repo.list_root(&fx.owner, fx.pid()).unwrap().is_empty());
    assert!(fx.repo.list_project(&fx.owner, fx.pid()).unwrap().is_empty());
}

#[test]
fn list_root_puts_folders_first_then_names() {
    let fx = Fixture::new();
    fx.file(None, "zebra.txt");
    fx.folder(None, "src");
    fx.file(None, "Apple.txt");
    fx.folder(None, "Docs");
    fx.file(None, "banana.txt");

    assert_eq!(
        fx.names(None),
        vec!["Docs", "src", "Apple.txt", "banana.txt", "zebra.txt"]
    );
}

#[test]
fn list_root_matches_list_children_of_none() {
    let fx = Fixture::new();
    fx.folder(None, "b");
    fx.file(None, "a");
    let root = fx.repo.list_root(&fx.owner, fx.pid()).unwrap();
    let children = fx.repo.list_children(&fx.owner, fx.pid(), None).unwrap();
    assert_eq!(root, children);
}

#[test]
fn list_children_only_returns_direct_children() {
    let fx = Fixture::new();
    let src = fx.folder(None, "src");
    let pkg = fx.folder(Some(src.id), "pkg");
    fx.file(Some(pkg.id), "deep.go");
    fx.file(Some(src.id), "main.go");
    fx.file(None, "go.mod");

    assert_eq!(fx.names(Some(src.id)), vec!["pkg", "main.go"]);
}

#[test]
fn accented_names_sort_with_their_base_letter() {
    let fx = Fixture::new();
    for name in ["zebra", "Éclair", "apple", "eagle"] {
        fx.file(None, name);
    }
    assert_eq!(fx.names(None), vec!["apple", "eagle", "Éclair", "zebra"]);
}

#[test]
fn list_project_returns_every_entry_grouped_by_parent() {
    let fx = Fixture::new();
    let src = fx.folder(None, "src");
    fx.file(Some(src.id), "b.go");
    fx.file(Some(src.id), "a.go");
    fx.file(None, "README.md");

    let all = fx.repo.list_project(&fx.owner, fx.pid()).unwrap();
    let names: Vec<_> = all.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["src", "README.md", "a.go", "b.go"]);
    assert_eq!(all[0].kind, EntryKind::Folder);
    assert!(all[2..].iter().all(|e| e.parent_id == Some(src.id)));
}

#[test]
fn listing_is_stable_across_calls() {
    let fx = Fixture::new();
    for name in ["b", "B", "a", "A"] {
        fx.file(None, name);
    }
    let first = fx.names(None);
    let second = fx.names(None);
    assert_eq!(first, second);
    assert_eq!(first.len(), 4);
}
