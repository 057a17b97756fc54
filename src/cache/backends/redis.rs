use async_trait::async_trait;
use redis::{AsyncCommands, aio::MultiplexedConnection};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, trace, warn};

use crate::cache::CacheBackend;
use crate::config::RedisConfig;
use crate::errors::{IscogramError, Result};

pub struct RedisBackend {
    client: redis::Client,
    /// 持久化连接，使用 RwLock 保护；出错时置空，下次调用重连
    connection: Arc<RwLock<Option<MultiplexedConnection>>>,
    key_prefix: String,
}

impl RedisBackend {
    /// 创建 Redis 后端
    ///
    /// URL 无效时返回错误；服务器暂时不可达只记录警告，
    /// 之后每次调用都会尝试重新建立连接。
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.clone()).map_err(|e| {
            IscogramError::cache_unavailable(format!(
                "Invalid Redis URL '{}': {}",
                config.url, e
            ))
        })?;

        let backend = Self {
            client,
            connection: Arc::new(RwLock::new(None)),
            key_prefix: config.key_prefix.clone(),
        };

        match backend.ping().await {
            Ok(response) => debug!("Redis connection test successful: {}", response),
            Err(e) => warn!(
                "Redis at {} is not reachable yet ({}); requests will fall back to the store",
                config.url, e
            ),
        }

        debug!("RedisBackend created with prefix: '{}'", backend.key_prefix);
        Ok(backend)
    }

    async fn ping(&self) -> Result<String> {
        let mut conn = self.get_connection().await?;
        match redis::cmd("PING").query_async::<String>(&mut conn).await {
            Ok(pong) => Ok(pong),
            Err(e) => {
                self.reset_connection().await;
                Err(e.into())
            }
        }
    }

    /// 获取或建立持久连接
    async fn get_connection(&self) -> Result<MultiplexedConnection> {
        {
            let conn_guard = self.connection.read().await;
            if let Some(ref conn) = *conn_guard {
                return Ok(conn.clone());
            }
        }

        let mut conn_guard = self.connection.write().await;

        // 双重检查，避免竞态条件
        if let Some(ref conn) = *conn_guard {
            return Ok(conn.clone());
        }

        let new_conn = self.client.get_multiplexed_async_connection().await?;
        *conn_guard = Some(new_conn.clone());
        debug!("Redis connection established and cached");

        Ok(new_conn)
    }

    /// 重置连接（在连接错误时调用）
    async fn reset_connection(&self) {
        let mut conn_guard = self.connection.write().await;
        *conn_guard = None;
        debug!("Redis connection reset due to error");
    }

    fn make_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    /// Maps a Redis result, dropping the cached connection when it is broken.
    async fn checked<T>(&self, key: &str, op: &str, result: redis::RedisResult<T>) -> Result<T> {
        match result {
            Ok(value) => Ok(value),
            Err(e) => {
                error!("Redis {} failed for key '{}': {}", op, key, e);
                if is_connection_error(&e) {
                    self.reset_connection().await;
                }
                Err(e.into())
            }
        }
    }
}

/// 只有连接层面的错误才需要重建连接，类型/解析错误不影响连接本身
fn is_connection_error(e: &redis::RedisError) -> bool {
    e.is_io_error() || e.is_connection_dropped()
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.get_connection().await?;
        let result: redis::RedisResult<Option<String>> = conn.get(self.make_key(key)).await;
        let value = self.checked(key, "GET", result).await?;
        trace!("Redis GET {} -> {}", key, if value.is_some() { "hit" } else { "miss" });
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let mut conn = self.get_connection().await?;
        // SETEX 不接受 0 秒
        let ttl_secs = ttl.as_secs().max(1);
        let result = conn
            .set_ex::<String, String, ()>(self.make_key(key), value, ttl_secs)
            .await;
        self.checked(key, "SETEX", result).await?;
        trace!("Redis SETEX {} ({}s)", key, ttl_secs);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let result = conn.del::<String, i32>(self.make_key(key)).await;
        let deleted = self.checked(key, "DEL", result).await?;
        if deleted > 0 {
            trace!("Successfully removed key from cache: {}", key);
        } else {
            trace!("Key not found in cache for removal: {}", key);
        }
        Ok(())
    }

    async fn flush_all(&self) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let result = redis::cmd("FLUSHDB").query_async::<()>(&mut conn).await;
        self.checked("*", "FLUSHDB", result).await?;
        debug!("Redis database flushed");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
