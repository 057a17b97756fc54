use async_trait::async_trait;
use moka::future::Cache;
use moka::policy::Expiry;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::cache::CacheBackend;
use crate::config::MemoryConfig;
use crate::errors::Result;

/// 缓存值：序列化后的负载与写入时指定的 TTL
#[derive(Clone)]
struct CachedPayload {
    data: Arc<str>,
    ttl: Duration,
}

/// 每个条目的 TTL 在写入时确定，覆盖写入会重新计时
struct PayloadExpiry;

impl Expiry<String, CachedPayload> for PayloadExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedPayload,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedPayload,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process backend for single-instance deployments and tests.
pub struct MokaBackend {
    inner: Cache<String, CachedPayload>,
}

impl MokaBackend {
    pub fn new(config: &MemoryConfig) -> Self {
        let inner = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(PayloadExpiry)
            .build();

        debug!(
            "MokaBackend initialized with max capacity: {}",
            config.max_capacity
        );
        Self { inner }
    }
}

impl Default for MokaBackend {
    fn default() -> Self {
        Self::new(&MemoryConfig::default())
    }
}

#[async_trait]
impl CacheBackend for MokaBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.inner.get(key).await.map(|v| v.data.to_string()))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let payload = CachedPayload {
            data: Arc::from(value),
            ttl,
        };
        self.inner.insert(key.to_string(), payload).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.inner.invalidate(key).await;
        Ok(())
    }

    async fn flush_all(&self) -> Result<()> {
        self.inner.invalidate_all();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
