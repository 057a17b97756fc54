use async_trait::async_trait;
use std::time::Duration;
use tracing::trace;

use crate::cache::CacheBackend;
use crate::errors::Result;

/// Backend that stores nothing: every lookup is a miss.
pub struct NullBackend;

#[async_trait]
impl CacheBackend for NullBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        trace!("NullBackend.get called for key: {}", key);
        Ok(None)
    }

    async fn set(&self, key: &str, _value: String, _ttl: Duration) -> Result<()> {
        trace!("NullBackend.set called for key: {}", key);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        trace!("NullBackend.delete called for key: {}", key);
        Ok(())
    }

    async fn flush_all(&self) -> Result<()> {
        trace!("NullBackend.flush_all called, but no action taken");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "null"
    }
}
