//! Cache Store Basic Operation Tests

use resq_infrastructure::cache::{CacheStore, SetOptions};
use resq_infrastructure::config::CacheConfig;
use std::time::Duration;

fn store_with_capacity(max_size: usize) -> CacheStore<String> {
    CacheStore::new(CacheConfig {
        max_size,
        ..Default::default()
    })
}

#[tokio::test(start_paused = true)]
async fn test_entry_expires_after_ttl() {
    let store = store_with_capacity(10);
    store.set(
        "listing:1",
        "loft".to_string(),
        SetOptions::new().with_ttl(Duration::from_millis(1_000)),
    );

    tokio::time::advance(Duration::from_millis(500)).await;
    assert_eq!(store.get("listing:1"), Some("loft".to_string()));

    tokio::time::advance(Duration::from_millis(700)).await;
    assert_eq!(store.get("listing:1"), None);
    assert!(store.is_empty(), "expired entry is removed on read");

    let metrics = store.stats().metrics;
    assert_eq!(metrics.hits, 1);
    assert_eq!(metrics.misses, 1);
    assert!((metrics.hit_rate - 0.5).abs() < f64::EPSILON);
}

#[tokio::test(start_paused = true)]
async fn test_entry_absent_exactly_at_ttl() {
    let store = store_with_capacity(10);
    store.set(
        "k",
        "v".to_string(),
        SetOptions::new().with_ttl(Duration::from_secs(1)),
    );

    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(!store.has("k"));
    assert_eq!(store.get("k"), None);
}

#[tokio::test(start_paused = true)]
async fn test_default_ttl_applies_when_unset() {
    let store: CacheStore<String> = CacheStore::new(CacheConfig {
        default_ttl_secs: 2,
        ..Default::default()
    });
    store.set("k", "v".to_string(), SetOptions::new());

    tokio::time::advance(Duration::from_millis(1_999)).await;
    assert!(store.has("k"));
    tokio::time::advance(Duration::from_millis(1)).await;
    assert!(!store.has("k"));
}

#[tokio::test(start_paused = true)]
async fn test_inserting_past_capacity_evicts_least_recently_accessed() {
    let store = store_with_capacity(3);
    store.set("a", "1".to_string(), SetOptions::new());
    store.set("b", "2".to_string(), SetOptions::new());
    store.set("c", "3".to_string(), SetOptions::new());

    assert!(store.get("a").is_some());
    store.set("d", "4".to_string(), SetOptions::new());

    assert_eq!(store.len(), 3);
    assert!(store.has("a"));
    assert!(!store.has("b"), "b was least recently accessed");
    assert!(store.has("c"));
    assert!(store.has("d"));
    assert_eq!(store.stats().metrics.evictions, 1);
}

#[tokio::test(start_paused = true)]
async fn test_default_capacity_holds_five_hundred_entries() {
    let store: CacheStore<u32> = CacheStore::new(CacheConfig::default());
    for i in 0..500 {
        store.set(&format!("key:{i}"), i, SetOptions::new());
        tokio::time::advance(Duration::from_millis(1)).await;
    }
    assert_eq!(store.len(), 500);

    store.set("key:500", 500, SetOptions::new());
    assert_eq!(store.len(), 500);
    assert!(!store.has("key:0"));
    assert!(store.has("key:500"));
}

#[tokio::test(start_paused = true)]
async fn test_replacing_existing_key_at_capacity_does_not_evict() {
    let store = store_with_capacity(2);
    store.set("a", "1".to_string(), SetOptions::new());
    store.set("b", "2".to_string(), SetOptions::new());
    store.set("a", "updated".to_string(), SetOptions::new());

    assert_eq!(store.len(), 2);
    assert_eq!(store.get("a"), Some("updated".to_string()));
    assert!(store.has("b"));
    assert_eq!(store.stats().metrics.evictions, 0);
}

#[tokio::test]
async fn test_invalidate_by_tags_returns_removed_count() {
    let store = store_with_capacity(10);
    store.set("p1", "x".to_string(), SetOptions::new().with_tag("properties"));
    store.set(
        "p2",
        "y".to_string(),
        SetOptions::new().with_tags(["properties", "featured"]),
    );
    store.set("u1", "z".to_string(), SetOptions::new().with_tag("users"));
    store.set("plain", "w".to_string(), SetOptions::new());

    assert_eq!(store.invalidate_by_tags(&["properties"]), 2);
    assert_eq!(store.invalidate_by_tags(&["properties"]), 0);
    assert_eq!(store.invalidate_by_tags(&["users", "missing"]), 1);
    assert_eq!(store.len(), 1);
    assert!(store.has("plain"));
}

#[tokio::test]
async fn test_every_operation_accepts_any_key() {
    let store = store_with_capacity(10);
    for key in ["", "multi\nline"] {
        store.set(key, "v".to_string(), SetOptions::new());
        assert_eq!(store.get(key), Some("v".to_string()));
        assert!(store.delete(key));
    }
    assert_eq!(store.stats().metrics.sets, 2);
}

#[tokio::test]
async fn test_zero_capacity_store_holds_nothing() {
    let store = store_with_capacity(0);
    store.set("a", "1".to_string(), SetOptions::new());

    assert!(store.is_empty());
    assert_eq!(store.get("a"), None);
    let metrics = store.stats().metrics;
    assert_eq!(metrics.sets, 0);
    assert_eq!(metrics.evictions, 0);
}

#[tokio::test]
async fn test_delete_has_and_clear() {
    let store = store_with_capacity(10);
    store.set("a", "1".to_string(), SetOptions::new());
    store.set("b", "2".to_string(), SetOptions::new());

    assert!(store.has("a"));
    assert!(store.delete("a"));
    assert!(!store.delete("a"));
    assert!(!store.has("a"));

    store.clear();
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_has_does_not_touch_metrics() {
    let store = store_with_capacity(10);
    store.set("a", "1".to_string(), SetOptions::new());
    assert!(store.has("a"));
    assert!(!store.has("missing"));

    let metrics = store.stats().metrics;
    assert_eq!(metrics.hits, 0);
    assert_eq!(metrics.misses, 0);
}

#[tokio::test(start_paused = true)]
async fn test_purge_expired_counts_as_evictions() {
    let store = store_with_capacity(10);
    store.set(
        "short1",
        "a".to_string(),
        SetOptions::new().with_ttl(Duration::from_secs(1)),
    );
    store.set(
        "short2",
        "b".to_string(),
        SetOptions::new().with_ttl(Duration::from_secs(1)),
    );
    store.set(
        "long",
        "c".to_string(),
        SetOptions::new().with_ttl(Duration::from_secs(60)),
    );

    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(store.len(), 3, "expired entries stay until swept");
    assert_eq!(store.purge_expired(), 2);
    assert_eq!(store.len(), 1);
    assert_eq!(store.stats().metrics.evictions, 2);
}

#[tokio::test(start_paused = true)]
async fn test_stats_lists_most_hit_entries_first() {
    let store = store_with_capacity(10);
    store.set("cold", "a".to_string(), SetOptions::new());
    store.set(
        "hot",
        "b".to_string(),
        SetOptions::new().with_source("listing-api"),
    );
    for _ in 0..3 {
        store.get("hot");
    }
    store.get("cold");

    let stats = store.stats();
    assert_eq!(stats.entries, 2);
    assert_eq!(stats.metrics.sets, 2);
    assert_eq!(stats.top_entries[0].key, "hot");
    assert_eq!(stats.top_entries[0].hit_count, 3);
    assert_eq!(stats.top_entries[0].source, "listing-api");
    assert_eq!(stats.top_entries[1].source, "unknown");
    assert_eq!(stats.config.max_size, 10);
    assert!(stats.top_entries[0].size_estimate_bytes > 0);
}

#[tokio::test(start_paused = true)]
async fn test_cleanup_task_sweeps_expired_entries() {
    let store: CacheStore<String> = CacheStore::new(CacheConfig {
        default_ttl_secs: 1,
        cleanup_interval_secs: 1,
        ..Default::default()
    });
    store.set("k", "v".to_string(), SetOptions::new());

    assert!(store.start_cleanup());
    assert!(!store.start_cleanup(), "second start is a no-op");

    tokio::time::sleep(Duration::from_millis(1_100)).await;
    assert_eq!(store.len(), 0);
    assert_eq!(store.stats().metrics.evictions, 1);

    store.shutdown();
    assert!(store.start_cleanup(), "sweep can restart after shutdown");
    store.shutdown();
}

#[tokio::test]
async fn test_clones_share_entries() {
    let store = store_with_capacity(10);
    let other = store.clone();
    store.set("a", "1".to_string(), SetOptions::new());
    assert_eq!(other.get("a"), Some("1".to_string()));
}
