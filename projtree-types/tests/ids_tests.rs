use projtree_types::{EntryId, ProjectId, StorageId, SubjectId, TypesError};
use std::collections::HashSet;
use std::str::FromStr;

// ── EntryId ───────────────────────────────────────────────────────

#[test]
fn entry_id_new_is_unique() {
    let a = EntryId::new();
    let b = EntryId::new();
    assert_ne!(a, b);
}

#[test]
fn entry_id_from_uuid_roundtrip() {
    let uuid = uuid::Uuid::now_v7();
    let id = EntryId::from_uuid(uuid);
    assert_eq!(id.as_uuid(), uuid);
}

#[test]
fn entry_id_display_and_parse() {
    let id = EntryId::new();
    let parsed = EntryId::parse(&id.to_string()).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn entry_id_parse_invalid() {
    assert!(matches!(EntryId::parse("not-a-uuid"), Err(TypesError::InvalidUuid(_))));
    assert!(matches!(EntryId::from_str("garbage"), Err(TypesError::InvalidUuid(_))));
    let err = StorageId::parse("1234").unwrap_err();
    assert!(err.to_string().starts_with("invalid UUID"), "{err}");
}

#[test]
fn entry_ids_are_time_ordered() {
    let first = EntryId::new();
    std::thread::sleep(std::time::Duration::from_millis(2));
    let second = EntryId::new();
    assert!(first < second);
}

#[test]
fn entry_id_hash_and_eq() {
    let id = EntryId::new();
    let mut set = HashSet::new();
    set.insert(id);
    set.insert(id);
    assert_eq!(set.len(), 1);
}

#[test]
fn entry_id_serializes_as_bare_uuid() {
    let id = EntryId::new();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{id}\""));
    let parsed: EntryId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, parsed);
}

// ── ProjectId / StorageId ────────────────────────────────────────

#[test]
fn project_id_from_str() {
    let id = ProjectId::new();
    let parsed: ProjectId = id.to_string().parse().unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn storage_id_default_is_unique() {
    assert_ne!(StorageId::default(), StorageId::default());
}

#[test]
fn id_debug_names_type() {
    assert!(format!("{:?}", ProjectId::new()).contains("ProjectId"));
    assert!(format!("{:?}", StorageId::new()).contains("StorageId"));
}

// ── SubjectId ────────────────────────────────────────────────────

#[test]
fn subject_id_rejects_blank() {
    assert!(SubjectId::new("").is_none());
    assert!(SubjectId::new("   ").is_none());
}

#[test]
fn subject_id_keeps_value() {
    let subject = SubjectId::new("user_2abc").unwrap();
    assert_eq!(subject.as_str(), "user_2abc");
    assert_eq!(subject.to_string(), "user_2abc");
}

#[test]
fn subject_id_equality_is_exact() {
    let a = SubjectId::new("user_a").unwrap();
    let b = SubjectId::new("USER_A").unwrap();
    assert_ne!(a, b);
}
