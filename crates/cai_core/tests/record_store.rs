use cai_core::db::open_db_in_memory;
use cai_core::{RecordStore, SqliteRecordStore, StoredRow};

fn row(content_id: i64, version_no: i64, identifier: &str, value: &str) -> StoredRow {
    StoredRow {
        content_id,
        version_no,
        identifier: identifier.to_string(),
        value: value.to_string(),
    }
}

#[test]
fn load_filters_by_version_and_identifier() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::new(&conn);

    store.insert(2, 1, "b", "2").unwrap();
    store.insert(2, 1, "a", "1").unwrap();
    store.insert(2, 2, "a", "3").unwrap();

    let version_rows = store.load(2, 1, None).unwrap();
    assert_eq!(version_rows, vec![row(2, 1, "a", "1"), row(2, 1, "b", "2")]);

    let single = store.load(2, 2, Some("a")).unwrap();
    assert_eq!(single, vec![row(2, 2, "a", "3")]);
}

#[test]
fn load_of_unknown_key_is_empty_not_an_error() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::new(&conn);

    assert!(store.load(42, 1, None).unwrap().is_empty());
    assert!(store.load(42, 1, Some("missing")).unwrap().is_empty());
}

#[test]
fn update_changes_only_the_exact_key_and_ignores_missing_rows() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::new(&conn);
    store.insert(2, 1, "a", "1").unwrap();
    store.insert(2, 2, "a", "1").unwrap();

    store.update(2, 1, "a", "9").unwrap();
    store.update(2, 1, "missing", "9").unwrap();

    assert_eq!(store.load(2, 1, Some("a")).unwrap()[0].value, "9");
    assert_eq!(store.load(2, 2, Some("a")).unwrap()[0].value, "1");
    assert!(store.load(2, 1, Some("missing")).unwrap().is_empty());
}

#[test]
fn delete_single_identifier_or_whole_version() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::new(&conn);
    store.insert(2, 1, "a", "1").unwrap();
    store.insert(2, 1, "b", "2").unwrap();
    store.insert(2, 2, "a", "3").unwrap();

    store.delete(2, 1, Some("a")).unwrap();
    assert_eq!(store.load(2, 1, None).unwrap(), vec![row(2, 1, "b", "2")]);

    store.delete(2, 1, None).unwrap();
    assert!(store.load(2, 1, None).unwrap().is_empty());
    assert_eq!(store.load(2, 2, None).unwrap().len(), 1);
}

#[test]
fn empty_identifier_is_a_real_identifier() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::new(&conn);
    store.insert(3, 1, "", "0").unwrap();
    store.insert(3, 1, "named", "1").unwrap();

    assert_eq!(store.load(3, 1, Some("")).unwrap(), vec![row(3, 1, "", "0")]);

    store.delete(3, 1, Some("")).unwrap();
    assert_eq!(store.load(3, 1, None).unwrap(), vec![row(3, 1, "named", "1")]);
}

#[test]
fn purge_removes_all_versions_of_listed_content_only() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::new(&conn);
    store.insert(5, 1, "a", "1").unwrap();
    store.insert(5, 2, "b", "2").unwrap();
    store.insert(6, 1, "a", "3").unwrap();
    store.insert(7, 1, "a", "4").unwrap();

    store.purge(&[5, 7]).unwrap();
    store.purge(&[]).unwrap();

    assert!(store.load(5, 1, None).unwrap().is_empty());
    assert!(store.load(5, 2, None).unwrap().is_empty());
    assert!(store.load(7, 1, None).unwrap().is_empty());
    assert_eq!(store.load(6, 1, None).unwrap().len(), 1);
}

#[test]
fn purge_accepts_more_ids_than_one_statement_can_bind() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::new(&conn);
    store.insert(5, 1, "a", "1").unwrap();
    store.insert(39_999, 3, "b", "2").unwrap();
    store.insert(50_000, 1, "a", "3").unwrap();

    let content_ids: Vec<i64> = (0..40_000).collect();
    store.purge(&content_ids).unwrap();

    assert!(store.load(5, 1, None).unwrap().is_empty());
    assert!(store.load(39_999, 3, None).unwrap().is_empty());
    assert_eq!(store.load(50_000, 1, None).unwrap().len(), 1);
}

#[test]
fn duplicate_insert_is_rejected_by_the_store() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::new(&conn);
    store.insert(2, 1, "a", "1").unwrap();

    assert!(store.insert(2, 1, "a", "2").is_err());
    assert_eq!(store.load(2, 1, Some("a")).unwrap()[0].value, "1");
}
