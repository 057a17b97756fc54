use std::sync::Arc;
use tracing::warn;

use crate::cache::ObjectCache;
use crate::errors::Result;
use crate::storage::{Category, Store};

pub struct CategoryService {
    storage: Arc<dyn Store>,
    cache: Arc<ObjectCache>,
}

impl CategoryService {
    pub fn new(storage: Arc<dyn Store>, cache: Arc<ObjectCache>) -> Self {
        Self { storage, cache }
    }

    /// 分类列表：先查缓存，未命中或缓存出错时回源
    pub async fn categories(&self) -> Result<Vec<Category>> {
        match self.cache.get_category_from_cache().await {
            Ok(Some(categories)) => return Ok(categories),
            Ok(None) => {}
            Err(e) => warn!("Failed to get categories from cache: {}", e),
        }

        let categories = self.storage.list_categories().await?;
        if let Err(e) = self.cache.set_category_cache(&categories).await {
            warn!("Failed to set category cache: {}", e);
        }
        Ok(categories)
    }

    /// Writes the store, then invalidates the collection so the next read
    /// repopulates it.
    pub async fn add_category(&self, name: &str) -> Result<Category> {
        let category = self.storage.insert_category(name).await?;
        if let Err(e) = self.cache.delete_category_cache().await {
            warn!("Failed to invalidate category cache: {}", e);
        }
        Ok(category)
    }
}
