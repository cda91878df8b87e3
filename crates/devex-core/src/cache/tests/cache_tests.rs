use std::time::Duration;

use crate::cache::TtlCache;

#[tokio::test]
async fn set_then_get_returns_value() {
    let cache: TtlCache<String> = TtlCache::new(Duration::from_secs(60));
    cache.set("k", "v".to_string());
    assert_eq!(cache.get("k"), Some("v".to_string()));

    let metrics = cache.metrics();
    assert_eq!(metrics.hits, 1);
    assert_eq!(metrics.misses, 0);
}

#[tokio::test]
async fn expired_entry_is_a_miss() {
    let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
    cache.set_with_ttl("k", 7, Duration::from_millis(10));
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert_eq!(cache.get("k"), None);
    assert_eq!(cache.metrics().misses, 1);
}

#[tokio::test]
async fn sweep_evicts_expired_entries() {
    let cache: TtlCache<u32> = TtlCache::new(Duration::from_millis(20));
    cache.set_with_ttl("a", 1, Duration::from_millis(5));
    cache.set_with_ttl("b", 2, Duration::from_secs(60));

    // Give the sweeper (ticking at ttl/2 = 10ms) time to run.
    tokio::time::sleep(Duration::from_millis(80)).await;

    assert_eq!(cache.len(), 1);
    let metrics = cache.metrics();
    assert!(
        metrics.evictions >= 1,
        "expected at least one eviction, got {}",
        metrics.evictions
    );
    assert_eq!(cache.get("b"), Some(2));
}

#[tokio::test]
async fn get_and_set_are_safe_after_close() {
    let cache: TtlCache<String> = TtlCache::new(Duration::from_secs(60));
    cache.set("k", "v".to_string());
    cache.close();

    // Post-close reads miss, writes are dropped, nothing panics.
    assert_eq!(cache.get("k"), None);
    cache.set("k2", "v2".to_string());
    assert_eq!(cache.get("k2"), None);
    assert!(cache.is_closed());
}

#[tokio::test]
async fn repeated_close_is_a_noop() {
    let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
    cache.close();
    cache.close();
    cache.close();
    assert!(cache.is_closed());
}

#[tokio::test]
async fn delete_and_clear_remove_entries() {
    let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
    cache.set("a", 1);
    cache.set("b", 2);

    cache.delete("a");
    assert_eq!(cache.get("a"), None);
    assert_eq!(cache.get("b"), Some(2));

    cache.clear();
    assert!(cache.is_empty());
}
