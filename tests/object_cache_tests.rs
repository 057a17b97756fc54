//! ObjectCache 集成测试
//!
//! 使用 moka 内存后端，覆盖读写删、并发计数、flush 以及后端故障时的计数语义。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use iscogram::cache::{CacheBackend, CacheKey, MokaBackend, ObjectCache};
use iscogram::errors::{IscogramError, Result};
use iscogram::metrics::CacheCounters;
use iscogram::storage::{Category, User};

// =============================================================================
// Helpers
// =============================================================================

fn memory_cache() -> ObjectCache {
    ObjectCache::with_ttls(
        Arc::new(MokaBackend::default()),
        Arc::new(CacheCounters::new()),
        Duration::from_secs(60),
        Duration::from_secs(60),
    )
}

/// Backend that can be switched into a failing state.
#[derive(Default)]
struct FlakyBackend {
    inner: MokaBackend,
    down: AtomicBool,
}

impl FlakyBackend {
    fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.down.load(Ordering::SeqCst) {
            Err(IscogramError::cache_unavailable("connection refused"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheBackend for FlakyBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        self.check()?;
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.check()?;
        self.inner.delete(key).await
    }

    async fn flush_all(&self) -> Result<()> {
        self.check()?;
        self.inner.flush_all().await
    }

    fn name(&self) -> &'static str {
        "flaky"
    }
}

// =============================================================================
// Read / write / delete
// =============================================================================

#[tokio::test]
async fn test_set_then_get_user_round_trip() {
    let cache = memory_cache();
    let mut user = User::new(42, "mizuki");
    user.authority = 1;

    cache.set_user_cache(&user).await.unwrap();
    let cached = cache.get_user_from_cache(42).await.unwrap();
    assert_eq!(cached, Some(user));
}

#[tokio::test]
async fn test_delete_then_get_is_absent_and_counted_as_miss() {
    let cache = memory_cache();
    cache.set_user_cache(&User::new(5, "kana")).await.unwrap();
    cache.delete_user_cache(5).await.unwrap();

    assert_eq!(cache.get_user_from_cache(5).await.unwrap(), None);
    let snapshot = cache.counters().snapshot();
    assert_eq!(snapshot.user_hits, 0);
    assert_eq!(snapshot.user_misses, 1);
}

#[tokio::test]
async fn test_category_list_uses_singleton_key() {
    let cache = memory_cache();
    let categories = vec![Category::new(1, "landscape"), Category::new(2, "food")];
    cache.set_category_cache(&categories).await.unwrap();

    let raw: Option<Vec<Category>> = cache.get(&CacheKey::categories()).await.unwrap();
    assert_eq!(raw, Some(categories));
    assert_eq!(CacheKey::categories().as_str(), "category_");
    assert_eq!(cache.counters().snapshot().category_hits, 1);
}

#[tokio::test]
async fn test_flush_all_clears_every_kind() {
    let cache = memory_cache();
    cache.set_user_cache(&User::new(1, "a")).await.unwrap();
    cache.set_user_cache(&User::new(2, "b")).await.unwrap();
    cache
        .set_category_cache(&[Category::new(1, "street")])
        .await
        .unwrap();

    cache.flush_all().await.unwrap();

    assert_eq!(cache.get_user_from_cache(1).await.unwrap(), None);
    assert_eq!(cache.get_user_from_cache(2).await.unwrap(), None);
    assert_eq!(cache.get_category_from_cache().await.unwrap(), None);
}

// =============================================================================
// Counters
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_misses_are_all_counted() {
    const N: usize = 200;
    let cache = Arc::new(memory_cache());

    let mut handles = Vec::with_capacity(N);
    for i in 0..N {
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(async move {
            cache.get_user_from_cache(i as i64 + 1).await.unwrap()
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_none());
    }

    let snapshot = cache.counters().snapshot();
    assert_eq!(snapshot.user_misses, N as u64);
    assert_eq!(snapshot.user_hits, 0);
    assert_eq!(snapshot.category_hits + snapshot.category_misses, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_hits_and_misses_sum_to_lookups() {
    let cache = Arc::new(memory_cache());
    for id in 1..=10 {
        cache.set_user_cache(&User::new(id, format!("u{}", id))).await.unwrap();
    }

    let mut handles = Vec::new();
    for i in 0..100i64 {
        let cache = Arc::clone(&cache);
        // ids 1..=20: half cached, half not
        handles.push(tokio::spawn(async move {
            cache.get_user_from_cache(i % 20 + 1).await.unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let snapshot = cache.counters().snapshot();
    assert_eq!(snapshot.user_hits, 50);
    assert_eq!(snapshot.user_misses, 50);
    assert!((snapshot.user_hit_rate() - 50.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_backend_error_is_reported_and_not_counted() {
    let backend = Arc::new(FlakyBackend::default());
    let cache = ObjectCache::with_ttls(
        backend.clone(),
        Arc::new(CacheCounters::new()),
        Duration::from_secs(60),
        Duration::from_secs(60),
    );
    cache.set_user_cache(&User::new(9, "tama")).await.unwrap();

    backend.set_down(true);
    let err = cache.get_user_from_cache(9).await.unwrap_err();
    assert!(err.is_cache_error());
    assert!(cache.get_category_from_cache().await.is_err());
    assert!(cache.set_user_cache(&User::new(10, "x")).await.is_err());
    assert!(cache.flush_all().await.is_err());

    let snapshot = cache.counters().snapshot();
    assert_eq!(snapshot.user_hits + snapshot.user_misses, 0);
    assert_eq!(snapshot.category_hits + snapshot.category_misses, 0);

    // 恢复后照常命中
    backend.set_down(false);
    assert!(cache.get_user_from_cache(9).await.unwrap().is_some());
    assert_eq!(cache.counters().snapshot().user_hits, 1);
}

#[tokio::test]
async fn test_entries_expire_after_ttl() {
    let cache = ObjectCache::with_ttls(
        Arc::new(MokaBackend::default()),
        Arc::new(CacheCounters::new()),
        Duration::from_millis(50),
        Duration::from_secs(60),
    );
    cache.set_user_cache(&User::new(3, "short")).await.unwrap();
    cache
        .set_category_cache(&[Category::new(1, "long")])
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(cache.get_user_from_cache(3).await.unwrap(), None);
    assert!(cache.get_category_from_cache().await.unwrap().is_some());
}
