use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::{self, CacheBackend, NullBackend};
use crate::config::StaticConfig;
use crate::context::AppContext;
use crate::metrics::{TimingSender, timing_channel};
use crate::runtime::background::BackgroundTasks;
use crate::storage::{MemoryStore, Store};

pub struct StartupContext {
    pub context: Arc<AppContext>,
    pub timing: TimingSender,
    pub tasks: BackgroundTasks,
}

/// 准备服务器启动的上下文
/// 包括缓存后端、存储、计数器和后台指标任务
///
/// Must run inside a tokio runtime: the metric tasks are spawned here.
pub async fn prepare_server_startup(config: &StaticConfig) -> anyhow::Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    // 缓存不可用时服务仍可运行，只是每次都回源
    let backend: Arc<dyn CacheBackend> = match cache::create_backend(&config.cache).await {
        Ok(backend) => backend,
        Err(e) => {
            warn!(
                "Cache backend '{}' unavailable, continuing without cache: {}",
                config.cache.backend, e
            );
            Arc::new(NullBackend)
        }
    };

    let store = MemoryStore::with_demo_data();
    info!(
        "Using storage backend: {} ({} users seeded)",
        store.backend_name(),
        store.user_count()
    );
    let storage: Arc<dyn Store> = Arc::new(store);

    let context = Arc::new(AppContext::build(backend, storage, &config.cache));

    let (timing, timing_rx) = timing_channel(
        config.metrics.timing_channel_capacity,
        config.metrics.overflow_policy,
    );
    let tasks = BackgroundTasks::spawn(context.counters(), timing_rx, &config.metrics);

    info!(
        "Pre-startup processing completed in {:?} (timing channel: capacity {}, policy {})",
        start_time.elapsed(),
        timing.capacity(),
        timing.policy()
    );

    Ok(StartupContext {
        context,
        timing,
        tasks,
    })
}
