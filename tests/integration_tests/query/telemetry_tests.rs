use galdrdb::engine::Engine;
use galdrdb::{api, query};
use std::sync::atomic::{AtomicU64, Ordering};

static COLLECTION_SEQ: AtomicU64 = AtomicU64::new(0);

#[test]
fn telemetry_default_rate_limit_is_set() {
    galdrdb::telemetry::set_default_rate_limit(5, 1);
    let collection = "telemetry_test";
    let limited_before = galdrdb::telemetry::would_limit(collection, 1);
    for _ in 0..10 {
        let _ = galdrdb::telemetry::try_consume_token(collection, 1);
    }
    let limited_after = galdrdb::telemetry::would_limit(collection, 1);
    assert!(!limited_before || limited_after);
}

#[test]
fn api_returns_rate_limited_error() {
    let tmp = std::env::temp_dir().join("galdrdb_telemetry_rate_api.wal");
    let engine = Engine::new(tmp).unwrap();
    let cname = format!("users_{}", COLLECTION_SEQ.fetch_add(1, Ordering::Relaxed));
    let col = engine.create_collection(cname.clone());
    galdrdb::telemetry::remove_rate_limit(&col.name_str());
    galdrdb::telemetry::configure_rate_limit(&col.name_str(), 1, 0);
    let filter = query::Filter::True;
    let res1 = api::count(&engine, &col.name_str(), &filter);
    assert!(res1.is_ok());
    let res2 = api::count(&engine, &col.name_str(), &filter);
    match res2 {
        Err(
            galdrdb::errors::DbError::RateLimitedWithRetry { .. }
            | galdrdb::errors::DbError::RateLimited,
        ) => {}
        other => panic!("unexpected: {other:?}"),
    }
}
