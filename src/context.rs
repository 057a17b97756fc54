//! Process-wide application context.
//!
//! Built once at startup and handed to the HTTP layer through `web::Data`.
//! The cache client and the hit/miss counters live here instead of in
//! globals, so tests can build as many independent contexts as they need.

use std::sync::Arc;

use crate::cache::{CacheBackend, ObjectCache};
use crate::config::CacheConfig;
use crate::metrics::CacheCounters;
use crate::services::{AdminService, CategoryService, UserService};
use crate::storage::Store;

pub struct AppContext {
    pub cache: Arc<ObjectCache>,
    pub storage: Arc<dyn Store>,
    pub users: UserService,
    pub categories: CategoryService,
    pub admin: AdminService,
}

impl AppContext {
    pub fn new(cache: Arc<ObjectCache>, storage: Arc<dyn Store>) -> Self {
        Self {
            users: UserService::new(Arc::clone(&storage), Arc::clone(&cache)),
            categories: CategoryService::new(Arc::clone(&storage), Arc::clone(&cache)),
            admin: AdminService::new(Arc::clone(&storage), Arc::clone(&cache)),
            cache,
            storage,
        }
    }

    /// Wire a context from a backend, fresh counters and the cache config.
    pub fn build(
        backend: Arc<dyn CacheBackend>,
        storage: Arc<dyn Store>,
        config: &CacheConfig,
    ) -> Self {
        let counters = Arc::new(CacheCounters::new());
        let cache = Arc::new(ObjectCache::new(backend, counters, config));
        Self::new(cache, storage)
    }

    pub fn counters(&self) -> Arc<CacheCounters> {
        Arc::clone(self.cache.counters())
    }
}
