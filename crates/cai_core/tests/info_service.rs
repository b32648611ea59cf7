use cai_core::db::open_db_in_memory;
use cai_core::{
    build_service, AdditionalInfo, AdditionalInfoService, CacheSettings, CachedInfoRepository,
    InMemoryTaggedCache, SetOutcome, SqliteRecordStore, StoreBackedRepository,
};
use rusqlite::Connection;
use serde_json::json;
use std::sync::Arc;

type CachedService<'conn> = AdditionalInfoService<
    CachedInfoRepository<StoreBackedRepository<SqliteRecordStore<'conn>>, Arc<InMemoryTaggedCache>>,
>;

fn cached_service(conn: &Connection, cache: Arc<InMemoryTaggedCache>) -> CachedService<'_> {
    let repo = StoreBackedRepository::new(SqliteRecordStore::new(conn));
    AdditionalInfoService::new(CachedInfoRepository::new(repo, cache))
}

fn row_count(conn: &Connection) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM content_additional_information;",
        [],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn set_creates_then_updates_and_evicts_record_key() {
    let conn = open_db_in_memory().unwrap();
    let cache = Arc::new(InMemoryTaggedCache::new());
    let service = cached_service(&conn, Arc::clone(&cache));

    let created = service
        .set(2, 1, "seo-title", &json!({"en": "Hello"}))
        .unwrap();
    assert_eq!(created, SetOutcome::Created);
    assert_eq!(
        service.get(2, 1, "seo-title").unwrap(),
        AdditionalInfo::new(2, 1, "seo-title", json!({"en": "Hello"}))
    );
    assert!(cache.contains_key("cai-2-1-seo-title"));

    let updated = service.set(2, 1, "seo-title", &json!({"en": "Hi"})).unwrap();
    assert_eq!(updated, SetOutcome::Updated);
    assert!(!cache.contains_key("cai-2-1-seo-title"));

    assert_eq!(
        service.get(2, 1, "seo-title").unwrap().value,
        json!({"en": "Hi"})
    );
}

#[test]
fn set_twice_leaves_exactly_one_record() {
    let conn = open_db_in_memory().unwrap();
    let service = cached_service(&conn, Arc::new(InMemoryTaggedCache::new()));

    service.set(3, 1, "flags", &json!([1, 2])).unwrap();
    service.set(3, 1, "flags", &json!([1, 2])).unwrap();

    assert_eq!(row_count(&conn), 1);
    assert_eq!(service.get(3, 1, "flags").unwrap().value, json!([1, 2]));
}

#[test]
fn delete_without_identifier_removes_whole_version() {
    let conn = open_db_in_memory().unwrap();
    let service = cached_service(&conn, Arc::new(InMemoryTaggedCache::new()));
    service.set(2, 1, "a", &json!("A")).unwrap();
    service.set(2, 1, "b", &json!("B")).unwrap();
    service.set(2, 2, "a", &json!("A2")).unwrap();
    assert_eq!(service.get_all(2, 1).unwrap().len(), 2);

    service.delete(2, 1, None).unwrap();

    assert!(service.get_all(2, 1).unwrap().is_empty());
    assert!(service.get(2, 1, "a").unwrap_err().is_not_found());
    assert_eq!(service.get_all(2, 2).unwrap().len(), 1);
}

#[test]
fn delete_single_identifier_keeps_siblings_visible_in_list() {
    let conn = open_db_in_memory().unwrap();
    let service = cached_service(&conn, Arc::new(InMemoryTaggedCache::new()));
    service.set(2, 1, "a", &json!("A")).unwrap();
    service.set(2, 1, "b", &json!("B")).unwrap();
    service.get_all(2, 1).unwrap();

    service.delete(2, 1, Some("a")).unwrap();

    let remaining = service.get_all(2, 1).unwrap();
    assert_eq!(remaining, vec![AdditionalInfo::new(2, 1, "b", json!("B"))]);
}

#[test]
fn purge_removes_every_version() {
    let conn = open_db_in_memory().unwrap();
    let service = cached_service(&conn, Arc::new(InMemoryTaggedCache::new()));
    service.set(5, 1, "a", &json!(1)).unwrap();
    service.set(5, 2, "a", &json!(2)).unwrap();
    service.set(5, 2, "b", &json!(3)).unwrap();
    service.get_all(5, 1).unwrap();
    service.get_all(5, 2).unwrap();

    service.purge(&[5]).unwrap();

    assert!(service.get_all(5, 1).unwrap().is_empty());
    assert!(service.get_all(5, 2).unwrap().is_empty());
    assert_eq!(row_count(&conn), 0);
}

#[test]
fn get_many_returns_existing_records_in_order() {
    let conn = open_db_in_memory().unwrap();
    let service = cached_service(&conn, Arc::new(InMemoryTaggedCache::new()));
    service.set(2, 1, "a", &json!(1)).unwrap();
    service.set(2, 1, "b", &json!(2)).unwrap();

    let found = service.get_many(2, 1, &["b", "zzz", "a"]).unwrap();
    assert_eq!(
        found,
        vec![
            AdditionalInfo::new(2, 1, "b", json!(2)),
            AdditionalInfo::new(2, 1, "a", json!(1)),
        ]
    );
}

#[test]
fn copy_version_overwrites_target_and_counts_records() {
    let conn = open_db_in_memory().unwrap();
    let service = cached_service(&conn, Arc::new(InMemoryTaggedCache::new()));
    service.set(2, 1, "a", &json!("A")).unwrap();
    service.set(2, 1, "b", &json!("B")).unwrap();
    service.set(2, 2, "a", &json!("stale")).unwrap();
    service.get(2, 2, "a").unwrap();

    let copied = service.copy_version(2, 1, 2, 2).unwrap();

    assert_eq!(copied, 2);
    assert_eq!(service.get(2, 2, "a").unwrap().value, json!("A"));
    assert_eq!(service.get_all(2, 2).unwrap().len(), 2);
}

#[test]
fn build_service_without_cache_reads_the_store_directly() {
    let conn = open_db_in_memory().unwrap();
    let cache = Arc::new(InMemoryTaggedCache::new());
    let service = build_service(&conn, Arc::clone(&cache), &CacheSettings { enabled: false });

    service.set(2, 1, "a", &json!(1)).unwrap();
    assert_eq!(service.get(2, 1, "a").unwrap().value, json!(1));
    assert!(cache.is_empty());
}

#[test]
fn build_service_with_cache_populates_shared_cache() {
    let conn = open_db_in_memory().unwrap();
    let cache = Arc::new(InMemoryTaggedCache::new());
    let service = build_service(&conn, Arc::clone(&cache), &CacheSettings::default());

    service.set(2, 1, "a", &json!(1)).unwrap();
    service.get(2, 1, "a").unwrap();

    assert!(cache.contains_key("cai-2-1-a"));
}
