//! Object cache fronting the store.
//!
//! - `kind`: key namespaces and the fixed schema of each cached entity
//! - `traits`: the raw key-value backend contract
//! - `backends`: Redis (shared network cache), moka (in-process), null
//! - `object_cache`: typed get/set/delete with hit/miss accounting

pub mod backends;
pub mod kind;
pub mod object_cache;
pub mod traits;

use std::sync::Arc;
use tracing::info;

pub use backends::{MokaBackend, NullBackend, RedisBackend};
pub use kind::{CacheEntity, CacheKey, CacheKind};
pub use object_cache::ObjectCache;
pub use traits::CacheBackend;

use crate::config::CacheConfig;
use crate::errors::{IscogramError, Result};

/// 根据配置创建缓存后端
pub async fn create_backend(config: &CacheConfig) -> Result<Arc<dyn CacheBackend>> {
    let backend: Arc<dyn CacheBackend> = match config.backend.to_lowercase().as_str() {
        "redis" => Arc::new(backends::RedisBackend::new(&config.redis).await?),
        "memory" | "moka" => Arc::new(backends::MokaBackend::new(&config.memory)),
        "null" | "none" => Arc::new(backends::NullBackend),
        other => {
            return Err(IscogramError::cache_backend_not_found(format!(
                "Unknown cache backend '{}'. Valid: redis, memory, null",
                other
            )));
        }
    };
    info!("Using cache backend: {}", backend.name());
    Ok(backend)
}
