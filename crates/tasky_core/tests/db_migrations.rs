use rusqlite::Connection;
use tasky_core::db::migrations::latest_version;
use tasky_core::db::{open_db, open_db_in_memory, DbError};
use tasky_core::{KvStore, SqliteKvStore, StoreError};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "kv_entries");
}

#[test]
fn opening_same_database_twice_is_idempotent_and_keeps_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasky.db");

    let store = SqliteKvStore::open(&path).unwrap();
    assert_eq!(schema_version(store.connection()), latest_version());
    store.set("projects", "[]").unwrap();
    drop(store);

    let reopened = SqliteKvStore::open(&path).unwrap();
    assert_eq!(schema_version(reopened.connection()), latest_version());
    assert_eq!(reopened.get("projects").unwrap().as_deref(), Some("[]"));
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn store_rejects_connection_without_kv_table() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SqliteKvStore::from_connection(conn).err().unwrap();
    assert!(matches!(err, StoreError::MissingTable("kv_entries")));
}

#[test]
fn sqlite_store_set_many_and_prefix_scan() {
    let store = SqliteKvStore::open_in_memory().unwrap();
    store
        .set_many(&[
            ("kanban.todo".to_string(), "[]".to_string()),
            ("kanban.done".to_string(), "[]".to_string()),
            ("notes".to_string(), "[]".to_string()),
        ])
        .unwrap();
    store.set("kanban.todo", "[1]").unwrap();
    store.remove("notes").unwrap();
    store.remove("missing").unwrap();

    assert_eq!(store.get("kanban.todo").unwrap().as_deref(), Some("[1]"));
    assert_eq!(store.get("notes").unwrap(), None);
    assert_eq!(
        store.keys_with_prefix("kanban.").unwrap(),
        vec!["kanban.done".to_string(), "kanban.todo".to_string()]
    );
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
