use rusqlite::{params, Connection};
use studylog_core::db::schema::{current_user_version, REQUIRED_TABLES, SCHEMA_VERSION};
use studylog_core::db::{open_db, open_db_in_memory, open_db_shared_memory, DbError};

#[test]
fn open_db_in_memory_applies_schema() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(current_user_version(&conn).unwrap(), SCHEMA_VERSION);
    for table in REQUIRED_TABLES {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("study.sqlite3");

    let first = open_db(&path).unwrap();
    first
        .execute(
            "INSERT INTO topics (uuid, name, description, difficulty) VALUES (?1, ?2, '', 2);",
            params!["00000000-0000-4000-8000-000000000001", "Rust"],
        )
        .unwrap();
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(current_user_version(&second).unwrap(), SCHEMA_VERSION);
    let count: i64 = second
        .query_row("SELECT COUNT(*) FROM topics;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 42;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 42);
            assert_eq!(latest_supported, SCHEMA_VERSION);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn foreign_keys_are_enforced_on_join_table() {
    let conn = open_db_in_memory().unwrap();

    let fk_enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(fk_enabled, 1);

    let err = conn
        .execute(
            "INSERT INTO topic_sessions (topic_uuid, session_uuid) VALUES ('missing', 'missing');",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().contains("FOREIGN KEY"));
}

#[test]
fn schema_checks_reject_out_of_range_columns() {
    let conn = open_db_in_memory().unwrap();

    let difficulty_err = conn.execute(
        "INSERT INTO topics (uuid, name, description, difficulty) VALUES ('a', 'x', '', 6);",
        [],
    );
    assert!(difficulty_err.is_err());

    let duration_err = conn.execute(
        "INSERT INTO study_sessions (uuid, session_date, duration_minutes, note)
         VALUES ('b', '2100-01-01', 0, '');",
        [],
    );
    assert!(duration_err.is_err());
}

#[test]
fn shared_memory_handles_see_the_same_data() {
    let name = "studylog-schema-shared-test";
    let keeper = open_db_shared_memory(name).unwrap();
    keeper
        .execute(
            "INSERT INTO topics (uuid, name, description, difficulty) VALUES ('t1', 'Go', '', 1);",
            [],
        )
        .unwrap();

    let other = open_db_shared_memory(name).unwrap();
    let name_read: String = other
        .query_row("SELECT name FROM topics WHERE uuid = 't1';", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(name_read, "Go");
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "missing table `{table_name}`");
}
