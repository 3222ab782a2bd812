//! Cache store: TTL, lazy expiry, upsert semantics, corrupt rows.

mod common;

use common::dish;
use dishq::infrastructure::storage::db::{
    entry_count, get_cached_at, init_database_in_memory, poison_entry, set_cached, set_created_at,
};

const TTL_DAYS: u32 = 7;
const TTL_SECS: i64 = 7 * 86_400;

#[tokio::test]
async fn get_round_trips_a_fresh_entry() {
    let db = init_database_in_memory().await.unwrap();
    let dishes = vec![dish("Caesar Salad", &["romaine", "parmesan"])];
    set_cached(&db, "joe's diner", &dishes, Some("https://joesdiner.com"))
        .await
        .unwrap();

    let now = chrono::Utc::now().timestamp();
    let entry = get_cached_at(&db, "joe's diner", TTL_DAYS, now)
        .await
        .unwrap()
        .expect("fresh entry should be present");
    assert_eq!(entry.dishes, dishes);
    assert_eq!(entry.source_url.as_deref(), Some("https://joesdiner.com"));
}

#[tokio::test]
async fn entry_at_exactly_ttl_is_still_valid() {
    let db = init_database_in_memory().await.unwrap();
    set_cached(&db, "k", &[dish("A", &["a"])], None).await.unwrap();

    let now = chrono::Utc::now().timestamp();
    set_created_at(&db, "k", now - TTL_SECS).await.unwrap();

    assert!(get_cached_at(&db, "k", TTL_DAYS, now).await.unwrap().is_some());
}

#[tokio::test]
async fn expired_entry_is_deleted_on_read() {
    let db = init_database_in_memory().await.unwrap();
    set_cached(&db, "k", &[dish("A", &["a"])], None).await.unwrap();

    let now = chrono::Utc::now().timestamp();
    set_created_at(&db, "k", now - TTL_SECS - 1).await.unwrap();

    assert!(get_cached_at(&db, "k", TTL_DAYS, now).await.unwrap().is_none());
    // Lazy delete happened as a side effect of the read.
    assert_eq!(entry_count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn put_replaces_rather_than_merges() {
    let db = init_database_in_memory().await.unwrap();
    let full_menu = vec![dish("A", &["a"]), dish("B", &["b"])];
    set_cached(&db, "k", &full_menu, Some("https://a.com/menu")).await.unwrap();

    let single = vec![dish("C", &["c"])];
    set_cached(&db, "k", &single, Some("https://a.com/menu.pdf"))
        .await
        .unwrap();

    let now = chrono::Utc::now().timestamp();
    let entry = get_cached_at(&db, "k", TTL_DAYS, now).await.unwrap().unwrap();
    assert_eq!(entry.dishes, single);
    assert_eq!(entry.source_url.as_deref(), Some("https://a.com/menu.pdf"));
    assert_eq!(entry_count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn absent_key_is_a_miss() {
    let db = init_database_in_memory().await.unwrap();
    let now = chrono::Utc::now().timestamp();
    assert!(get_cached_at(&db, "nobody", TTL_DAYS, now).await.unwrap().is_none());
}

#[tokio::test]
async fn corrupt_blob_self_heals_to_a_miss() {
    let db = init_database_in_memory().await.unwrap();
    set_cached(&db, "k", &[dish("A", &["a"])], None).await.unwrap();
    poison_entry(&db, "k").await.unwrap();

    let now = chrono::Utc::now().timestamp();
    assert!(get_cached_at(&db, "k", TTL_DAYS, now).await.unwrap().is_none());
    assert_eq!(entry_count(&db).await.unwrap(), 0);
}

#[test]
fn restaurant_key_is_stable_under_case_and_whitespace() {
    use dishq::domain::model::restaurant_key;

    let variants = ["Joe's Diner", "  joe's diner ", "JOE'S DINER", "joe's diner"];
    let keys: Vec<String> = variants.iter().map(|v| restaurant_key(None, v)).collect();
    assert!(keys.iter().all(|k| k == "joe's diner"));

    // Idempotent: deriving from an already-derived key changes nothing.
    assert_eq!(restaurant_key(None, &keys[0]), keys[0]);
}
