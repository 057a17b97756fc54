use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

use super::{CacheBackend, CacheEntity, CacheKey, CacheKind};
use crate::config::CacheConfig;
use crate::errors::Result;
use crate::metrics::CacheCounters;
use crate::storage::{Category, User};

/// Typed write-through cache over a [`CacheBackend`].
///
/// A miss is `Ok(None)`. Any `Err` means the cache could not answer
/// (backend down, undecodable payload); callers fall back to the store and
/// never surface it to the end user. Only clean hits and misses move the
/// counters.
pub struct ObjectCache {
    backend: Arc<dyn CacheBackend>,
    counters: Arc<CacheCounters>,
    user_ttl: Duration,
    category_ttl: Duration,
}

impl ObjectCache {
    pub fn new(
        backend: Arc<dyn CacheBackend>,
        counters: Arc<CacheCounters>,
        config: &CacheConfig,
    ) -> Self {
        Self::with_ttls(
            backend,
            counters,
            Duration::from_secs(config.user_ttl),
            Duration::from_secs(config.category_ttl),
        )
    }

    pub fn with_ttls(
        backend: Arc<dyn CacheBackend>,
        counters: Arc<CacheCounters>,
        user_ttl: Duration,
        category_ttl: Duration,
    ) -> Self {
        Self {
            backend,
            counters,
            user_ttl,
            category_ttl,
        }
    }

    pub fn counters(&self) -> &Arc<CacheCounters> {
        &self.counters
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn ttl_for(&self, kind: CacheKind) -> Duration {
        match kind {
            CacheKind::User => self.user_ttl,
            CacheKind::Category => self.category_ttl,
        }
    }

    pub async fn get<E: CacheEntity>(&self, key: &CacheKey) -> Result<Option<E>> {
        debug_assert_eq!(key.kind(), E::KIND);

        let Some(data) = self.backend.get(key.as_str()).await? else {
            self.counters.record_miss(key.kind());
            trace!("Cache miss: {}", key);
            return Ok(None);
        };

        let value = serde_json::from_str::<E>(&data).inspect_err(|e| {
            debug!("Discarding undecodable cache entry '{}': {}", key, e);
        })?;
        self.counters.record_hit(key.kind());
        trace!("Cache hit: {}", key);
        Ok(Some(value))
    }

    pub async fn set<E: CacheEntity>(&self, key: &CacheKey, value: &E) -> Result<()> {
        debug_assert_eq!(key.kind(), E::KIND);
        let data = serde_json::to_string(value)?;
        self.put(key, data).await
    }

    /// Removing an absent key succeeds.
    pub async fn delete(&self, key: &CacheKey) -> Result<()> {
        self.backend.delete(key.as_str()).await
    }

    /// 清空整个缓存后端（管理员初始化钩子）
    pub async fn flush_all(&self) -> Result<()> {
        debug!("Flushing entire {} cache", self.backend.name());
        self.backend.flush_all().await
    }

    async fn put(&self, key: &CacheKey, data: String) -> Result<()> {
        let ttl = self.ttl_for(key.kind());
        self.backend.set(key.as_str(), data, ttl).await?;
        trace!("Cached {} for {:?}", key, ttl);
        Ok(())
    }

    // ===== Handler-facing API =====

    pub async fn get_user_from_cache(&self, user_id: i64) -> Result<Option<User>> {
        self.get(&CacheKey::user(user_id)).await
    }

    /// The empty session projection (`id == 0`) is never cached.
    pub async fn set_user_cache(&self, user: &User) -> Result<()> {
        if user.is_empty() {
            trace!("Skipping cache write for empty user");
            return Ok(());
        }
        self.set(&CacheKey::user(user.id), user).await
    }

    pub async fn delete_user_cache(&self, user_id: i64) -> Result<()> {
        self.delete(&CacheKey::user(user_id)).await
    }

    pub async fn get_category_from_cache(&self) -> Result<Option<Vec<Category>>> {
        self.get(&CacheKey::categories()).await
    }

    pub async fn set_category_cache(&self, categories: &[Category]) -> Result<()> {
        let data = serde_json::to_string(categories)?;
        self.put(&CacheKey::categories(), data).await
    }

    pub async fn delete_category_cache(&self) -> Result<()> {
        self.delete(&CacheKey::categories()).await
    }
}
