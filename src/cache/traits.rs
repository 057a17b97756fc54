use async_trait::async_trait;
use std::time::Duration;

use crate::errors::Result;

/// Raw key-value backend behind the object cache.
///
/// - `get` returns `Ok(None)` for a miss; `Err` only when the backend itself
///   failed (connection, protocol)
/// - `delete` of an absent key is not an error
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// 清空整个缓存（仅管理员初始化时调用）
    async fn flush_all(&self) -> Result<()>;

    fn name(&self) -> &'static str;
}
