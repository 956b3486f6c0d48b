//! End-to-end scenarios from SPEC_FULL.md §8 (S1-S6), driven through the
//! same statement surface the command driver uses.

use bantam_db::database::DatabaseManager;
use bantam_db::error::EngineError;
use bantam_db::persistence::{self, Format};
use bantam_db::sql::execute_line;
use bantam_db::value::Value;

fn setup_basic(mgr: &mut DatabaseManager) {
    assert!(execute_line(mgr, "CREATE DATABASE D; USE D;"));
    assert!(execute_line(
        mgr,
        "ADD TABLE t (id INT PRIMARY_KEY, name STRING);"
    ));
    assert!(execute_line(
        mgr,
        "INSERT INTO t (id, name) VALUES (1, alice); INSERT INTO t (id, name) VALUES (2, bob);"
    ));
}

#[test]
fn s1_basic_create() {
    let mut mgr = DatabaseManager::new();
    setup_basic(&mut mgr);
    let db = mgr.current().unwrap();
    let t = db.get_table("t").unwrap();
    assert_eq!(t.rows().len(), 2);
    assert_eq!(
        t.get_primary_key().unwrap().index().unwrap().in_order(),
        vec![Value::Int(1), Value::Int(2)]
    );
}

#[test]
fn s2_duplicate_pk_rejected() {
    let mut mgr = DatabaseManager::new();
    setup_basic(&mut mgr);
    assert!(!execute_line(
        &mut mgr,
        "INSERT INTO t (id, name) VALUES (1, carol);"
    ));
    let db = mgr.current().unwrap();
    assert_eq!(db.get_table("t").unwrap().rows().len(), 2);
}

#[test]
fn s3_foreign_key_success_and_failure() {
    let mut mgr = DatabaseManager::new();
    execute_line(&mut mgr, "CREATE DATABASE D; USE D;");
    execute_line(&mut mgr, "ADD TABLE dept (did INT PRIMARY_KEY);");
    execute_line(
        &mut mgr,
        "ADD TABLE emp (eid INT PRIMARY_KEY, dref INT REFERENCES dept(did));",
    );
    execute_line(&mut mgr, "INSERT INTO dept (did) VALUES (10);");
    assert!(execute_line(
        &mut mgr,
        "INSERT INTO emp (eid, dref) VALUES (1, 10);"
    ));
    assert!(!execute_line(
        &mut mgr,
        "INSERT INTO emp (eid, dref) VALUES (2, 99);"
    ));
    let db = mgr.current().unwrap();
    assert_eq!(db.get_table("emp").unwrap().rows().len(), 1);
}

#[test]
fn s4_remove() {
    let mut mgr = DatabaseManager::new();
    setup_basic(&mut mgr);
    assert!(execute_line(&mut mgr, "REMOVE FROM t WHERE id = 1;"));
    let db = mgr.current().unwrap();
    let t = db.get_table("t").unwrap();
    assert_eq!(t.rows().len(), 1);
    assert_eq!(
        t.get_primary_key().unwrap().index().unwrap().in_order(),
        vec![Value::Int(2)]
    );
}

#[test]
fn s5_update_changes_pk() {
    let mut mgr = DatabaseManager::new();
    setup_basic(&mut mgr);
    assert!(execute_line(
        &mut mgr,
        "UPDATE t SET id = 3, name = alice2 WHERE id = 1;"
    ));
    let db = mgr.current().unwrap();
    let t = db.get_table("t").unwrap();
    assert_eq!(
        t.get_primary_key().unwrap().index().unwrap().in_order(),
        vec![Value::Int(2), Value::Int(3)]
    );
    assert!(t.rows().iter().any(|r| r.get("name") == Some(&Value::Str("alice2".to_string()))));
}

#[test]
fn s6_persistence_round_trip() {
    let mut mgr = DatabaseManager::new();
    setup_basic(&mut mgr);
    let db = mgr.current().unwrap();

    let mut buf = Vec::new();
    persistence::save_database(db, &mut buf).unwrap();
    let mut cursor = &buf[..];
    let loaded = persistence::load_database(&mut cursor, Format::V2).unwrap();

    let original_table = db.get_table("t").unwrap();
    let loaded_table = loaded.get_table("t").unwrap();
    assert_eq!(original_table.rows().len(), loaded_table.rows().len());
    for (a, b) in original_table.rows().iter().zip(loaded_table.rows().iter()) {
        assert_eq!(a.get("id"), b.get("id"));
        assert_eq!(a.get("name"), b.get("name"));
    }
}

#[test]
fn update_revalidates_foreign_keys_end_to_end() {
    let mut mgr = DatabaseManager::new();
    execute_line(&mut mgr, "CREATE DATABASE D; USE D;");
    execute_line(&mut mgr, "ADD TABLE dept (did INT PRIMARY_KEY);");
    execute_line(
        &mut mgr,
        "ADD TABLE emp (eid INT PRIMARY_KEY, dref INT REFERENCES dept(did));",
    );
    execute_line(&mut mgr, "INSERT INTO dept (did) VALUES (10);");
    execute_line(&mut mgr, "INSERT INTO emp (eid, dref) VALUES (1, 10);");
    assert!(!execute_line(
        &mut mgr,
        "UPDATE emp SET eid = 1, dref = 999 WHERE eid = 1;"
    ));
}

#[test]
fn missing_database_surfaces_typed_error() {
    let mut mgr = DatabaseManager::new();
    use bantam_db::sql::{execute, parse};
    let stmt = parse("USE ghosts").unwrap();
    let err = execute(&mut mgr, stmt).unwrap_err();
    assert!(matches!(err, EngineError::UnknownDatabase(_)));
}
