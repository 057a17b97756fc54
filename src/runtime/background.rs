//! Background metric tasks and their shutdown.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::config::MetricsConfig;
use crate::metrics::{
    AggregatorStats, CacheCounters, CacheMetricsReporter, RequestMetricsAggregator, TimingReceiver,
};

/// What the background tasks reported when they stopped.
///
/// A field is `None` if that task panicked or did not finish within the
/// shutdown grace period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackgroundSummary {
    pub cache_reports: Option<u64>,
    pub request_stats: Option<AggregatorStats>,
}

/// Cache metrics reporter plus request metrics aggregator.
pub struct BackgroundTasks {
    shutdown_tx: watch::Sender<bool>,
    cache_reporter: JoinHandle<u64>,
    request_aggregator: JoinHandle<AggregatorStats>,
}

impl BackgroundTasks {
    /// Start both tasks on the current tokio runtime.
    pub fn spawn(
        counters: Arc<CacheCounters>,
        timing_rx: TimingReceiver,
        config: &MetricsConfig,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let cache_reporter = CacheMetricsReporter::new(counters, config.cache_report_period())
            .spawn(shutdown_rx.clone());
        let request_aggregator =
            RequestMetricsAggregator::new(timing_rx, config.request_report_period())
                .spawn(shutdown_rx);

        info!(
            "Metrics tasks started (cache every {:?}, requests every {:?})",
            config.cache_report_period(),
            config.request_report_period()
        );

        Self {
            shutdown_tx,
            cache_reporter,
            request_aggregator,
        }
    }

    /// Signal both tasks and wait up to `grace` for each of them.
    pub async fn shutdown(self, grace: Duration) -> BackgroundSummary {
        let Self {
            shutdown_tx,
            cache_reporter,
            request_aggregator,
        } = self;

        // 两个任务都已退出时 send 失败，无需处理
        let _ = shutdown_tx.send(true);

        let summary = BackgroundSummary {
            cache_reports: join_task("cache metrics reporter", cache_reporter, grace).await,
            request_stats: join_task("request metrics aggregator", request_aggregator, grace)
                .await,
        };

        if let Some(stats) = summary.request_stats {
            info!(
                "Request metrics aggregator flushed {} windows ({} records)",
                stats.windows_flushed, stats.records_processed
            );
        }
        summary
    }
}

async fn join_task<T>(name: &str, handle: JoinHandle<T>, grace: Duration) -> Option<T> {
    let abort = handle.abort_handle();
    match timeout(grace, handle).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            error!("Background task '{}' failed: {}", name, e);
            None
        }
        Err(_) => {
            warn!(
                "Background task '{}' did not stop within {:?}, aborting",
                name, grace
            );
            abort.abort();
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{OverflowPolicy, TimingRecord, timing_channel};

    fn metrics_config() -> MetricsConfig {
        MetricsConfig {
            cache_report_interval: 5,
            request_report_interval: 1,
            ..MetricsConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_joins_both_tasks() {
        let (tx, rx) = timing_channel(8, OverflowPolicy::Drop);
        let tasks = BackgroundTasks::spawn(Arc::new(CacheCounters::new()), rx, &metrics_config());

        tx.enqueue_timing(TimingRecord::new(
            "GET",
            "/categories",
            200,
            Duration::from_millis(3),
        ))
        .await;
        tokio::time::sleep(Duration::from_millis(5500)).await;

        let summary = tasks.shutdown(Duration::from_secs(1)).await;
        assert_eq!(summary.cache_reports, Some(1));
        let stats = summary.request_stats.unwrap();
        assert_eq!(stats.records_processed, 1);
        assert_eq!(stats.windows_flushed, 5);
    }

    #[tokio::test]
    async fn test_shutdown_flushes_pending_records() {
        let (tx, rx) = timing_channel(8, OverflowPolicy::Block);
        let config = MetricsConfig {
            request_report_interval: 3600,
            cache_report_interval: 3600,
            ..MetricsConfig::default()
        };
        let tasks = BackgroundTasks::spawn(Arc::new(CacheCounters::new()), rx, &config);

        for _ in 0..3 {
            tx.enqueue_timing(TimingRecord::new("GET", "/", 200, Duration::from_millis(1)))
                .await;
        }

        let summary = tasks.shutdown(Duration::from_secs(5)).await;
        assert_eq!(summary.cache_reports, Some(0));
        let stats = summary.request_stats.unwrap();
        assert_eq!(stats.records_processed, 3);
        assert_eq!(stats.windows_flushed, 1);
    }
}
