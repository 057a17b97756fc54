use std::sync::Arc;
use tracing::{info, warn};

use crate::cache::ObjectCache;
use crate::errors::Result;
use crate::storage::Store;

pub struct AdminService {
    storage: Arc<dyn Store>,
    cache: Arc<ObjectCache>,
}

impl AdminService {
    pub fn new(storage: Arc<dyn Store>, cache: Arc<ObjectCache>) -> Self {
        Self { storage, cache }
    }

    /// 管理员初始化：重置存储，然后清空整个缓存
    ///
    /// A cache flush failure is logged only; entries then age out by TTL.
    pub async fn initialize(&self) -> Result<()> {
        self.storage.reset().await?;
        match self.cache.flush_all().await {
            Ok(()) => info!("Store reset and cache flushed"),
            Err(e) => warn!("Store reset but cache flush failed: {}", e),
        }
        Ok(())
    }
}
