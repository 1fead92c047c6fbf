use projtree_db::{DbConfig, DbError, lock, open, open_in_memory, share};
use std::time::Duration;

#[test]
fn in_memory_has_foreign_keys_enabled() {
    let conn = open_in_memory(&DbConfig::default()).unwrap();
    let fk: i64 = conn
        .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
        .unwrap();
    assert_eq!(fk, 1);
}

#[test]
fn file_database_uses_wal() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open(&dir.path().join("tree.db"), &DbConfig::default()).unwrap();
    let mode: String = conn
        .query_row("PRAGMA journal_mode", [], |row| row.get(0))
        .unwrap();
    assert_eq!(mode.to_lowercase(), "wal");
}

#[test]
fn wal_can_be_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let config = DbConfig {
        wal: false,
        ..Default::default()
    };
    let conn = open(&dir.path().join("tree.db"), &config).unwrap();
    let mode: String = conn
        .query_row("PRAGMA journal_mode", [], |row| row.get(0))
        .unwrap();
    assert_ne!(mode.to_lowercase(), "wal");
}

#[test]
fn busy_timeout_is_applied() {
    let config = DbConfig {
        busy_timeout: Duration::from_millis(250),
        ..Default::default()
    };
    let conn = open_in_memory(&config).unwrap();
    let timeout: i64 = conn
        .query_row("PRAGMA busy_timeout", [], |row| row.get(0))
        .unwrap();
    assert_eq!(timeout, 250);
}

#[test]
fn shared_connection_locks() {
    let shared = share(open_in_memory(&DbConfig::default()).unwrap());
    let conn = lock(&shared).unwrap();
    conn.execute_batch("CREATE TABLE t (x INTEGER)").unwrap();
}

#[test]
fn poisoned_lock_is_an_error() {
    let shared = share(open_in_memory(&DbConfig::default()).unwrap());
    let clone = shared.clone();
    let _ = std::thread::spawn(move || {
        let _guard = clone.lock().unwrap();
        panic!("poison the lock");
    })
    .join();
    assert!(matches!(lock(&shared), Err(DbError::Poisoned)));
}
