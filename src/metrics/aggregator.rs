//! Per-route request latency aggregation.
//!
//! The aggregator task is the only owner of the window table. Draining the
//! channel and flushing on the ticker happen in the same `select!` loop, so a
//! flush never interleaves with a table update.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use super::timing::{TimingReceiver, TimingRecord};

/// Count / mean / max for one route over one window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSummary {
    pub route: String,
    pub count: usize,
    pub avg: Duration,
    pub max: Duration,
}

impl RouteSummary {
    /// `None` for an empty sample set.
    pub fn from_samples(route: impl Into<String>, samples: &[Duration]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let total: u128 = samples.iter().map(|d| d.as_nanos()).sum();
        let avg_nanos = total / samples.len() as u128;
        let max = samples.iter().copied().max().unwrap_or_default();
        Some(Self {
            route: route.into(),
            count: samples.len(),
            avg: Duration::from_nanos(u64::try_from(avg_nanos).unwrap_or(u64::MAX)),
            max,
        })
    }
}

impl fmt::Display for RouteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Path: {}, Count: {}, Avg: {:?}, Max: {:?}",
            self.route, self.count, self.avg, self.max
        )
    }
}

/// Durations per `"METHOD path"` for the current window.
#[derive(Debug, Default)]
pub struct RouteAggregates {
    samples: HashMap<String, Vec<Duration>>,
}

impl RouteAggregates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: TimingRecord) {
        self.record_duration(record.route_key(), record.duration);
    }

    pub fn record_duration(&mut self, route: String, duration: Duration) {
        self.samples.entry(route).or_default().push(duration);
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of distinct routes in the window.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Summarise the window (sorted by route) and start a new, empty one.
    pub fn flush(&mut self) -> Vec<RouteSummary> {
        let window = std::mem::take(&mut self.samples);
        let mut summaries: Vec<RouteSummary> = window
            .into_iter()
            .filter_map(|(route, samples)| RouteSummary::from_samples(route, &samples))
            .collect();
        summaries.sort_by(|a, b| a.route.cmp(&b.route));
        summaries
    }
}

/// Totals returned when the aggregator task exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregatorStats {
    pub records_processed: u64,
    pub windows_flushed: u64,
}

/// Window table plus the bookkeeping needed to report it.
struct WindowReporter {
    table: RouteAggregates,
    dropped: Arc<AtomicU64>,
    last_dropped: u64,
    stats: AggregatorStats,
}

impl WindowReporter {
    fn record(&mut self, record: TimingRecord) {
        self.table.record(record);
        self.stats.records_processed += 1;
    }

    fn flush(&mut self) -> Vec<RouteSummary> {
        let summaries = self.table.flush();
        for summary in &summaries {
            info!(
                target: "iscogram::metrics::requests",
                route = %summary.route,
                count = summary.count,
                avg_ms = summary.avg.as_secs_f64() * 1000.0,
                max_ms = summary.max.as_secs_f64() * 1000.0,
                "{}",
                summary
            );
        }

        let dropped = self.dropped.load(Ordering::Relaxed);
        if dropped > self.last_dropped {
            warn!(
                target: "iscogram::metrics::requests",
                dropped = dropped - self.last_dropped,
                "Timing channel full: {} records dropped in this window",
                dropped - self.last_dropped
            );
            self.last_dropped = dropped;
        }

        self.stats.windows_flushed += 1;
        summaries
    }
}

/// Single consumer of the request timing channel.
pub struct RequestMetricsAggregator {
    receiver: TimingReceiver,
    period: Duration,
}

impl RequestMetricsAggregator {
    pub fn new(receiver: TimingReceiver, period: Duration) -> Self {
        Self { receiver, period }
    }

    /// Drain records and flush one window per `period`.
    ///
    /// Stops when `shutdown` flips to `true`, its sender is dropped, or every
    /// [`TimingSender`](super::TimingSender) is gone. Records still queued at
    /// that point go into one last window before returning.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> AggregatorStats {
        let Self {
            mut receiver,
            period,
        } = self;
        let mut window = WindowReporter {
            table: RouteAggregates::new(),
            dropped: receiver.dropped_counter(),
            last_dropped: 0,
            stats: AggregatorStats::default(),
        };

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        debug!("Request metrics aggregator started, window: {:?}", period);

        if !*shutdown.borrow() {
            loop {
                tokio::select! {
                    biased;
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        // 已入队的记录属于当前窗口
                        while let Some(record) = receiver.try_recv() {
                            window.record(record);
                        }
                        window.flush();
                    }
                    record = receiver.recv() => match record {
                        Some(record) => window.record(record),
                        None => {
                            debug!("All timing senders dropped");
                            break;
                        }
                    },
                }
            }
        }

        while let Some(record) = receiver.try_recv() {
            window.record(record);
        }
        if !window.table.is_empty() {
            window.flush();
        }

        debug!(
            "Request metrics aggregator stopped: {} records, {} windows",
            window.stats.records_processed, window.stats.windows_flushed
        );
        window.stats
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<AggregatorStats> {
        tokio::spawn(self.run(shutdown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::timing::{OverflowPolicy, timing_channel};

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_flush_computes_count_avg_max_and_resets() {
        let mut table = RouteAggregates::new();
        for d in [10, 20, 30] {
            table.record(TimingRecord::new("GET", "/posts", 200, ms(d)));
        }

        let summaries = table.flush();
        assert_eq!(
            summaries,
            vec![RouteSummary {
                route: "GET /posts".to_string(),
                count: 3,
                avg: ms(20),
                max: ms(30),
            }]
        );
        assert!(table.is_empty());
        assert!(table.flush().is_empty());
    }

    #[test]
    fn test_routes_are_keyed_by_method_and_path() {
        let mut table = RouteAggregates::new();
        table.record(TimingRecord::new("GET", "/login", 200, ms(1)));
        table.record(TimingRecord::new("POST", "/login", 302, ms(3)));
        table.record(TimingRecord::new("GET", "/login", 200, ms(5)));
        assert_eq!(table.len(), 2);

        let summaries = table.flush();
        assert_eq!(summaries[0].route, "GET /login");
        assert_eq!(summaries[0].count, 2);
        assert_eq!(summaries[0].avg, ms(3));
        assert_eq!(summaries[1].route, "POST /login");
        assert_eq!(summaries[1].max, ms(3));
    }

    #[test]
    fn test_summary_display() {
        let summary = RouteSummary::from_samples("GET /posts", &[ms(10), ms(30)]).unwrap();
        assert_eq!(
            summary.to_string(),
            "Path: GET /posts, Count: 2, Avg: 20ms, Max: 30ms"
        );
        assert!(RouteSummary::from_samples("GET /", &[]).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_flushes_each_window_and_drains_on_shutdown() {
        let (tx, rx) = timing_channel(16, OverflowPolicy::Drop);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = RequestMetricsAggregator::new(rx, Duration::from_secs(1)).spawn(shutdown_rx);

        tx.enqueue_timing(TimingRecord::new("GET", "/", 200, ms(4))).await;
        tokio::time::sleep(Duration::from_millis(2500)).await;
        tx.enqueue_timing(TimingRecord::new("GET", "/", 200, ms(8))).await;
        shutdown_tx.send(true).unwrap();

        let stats = handle.await.unwrap();
        assert_eq!(stats.records_processed, 2);
        // 两个定时窗口 + 关闭时的最后一次
        assert_eq!(stats.windows_flushed, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_records_queued_at_tick_belong_to_that_window() {
        let (tx, rx) = timing_channel(16, OverflowPolicy::Drop);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = RequestMetricsAggregator::new(rx, Duration::from_secs(1)).spawn(shutdown_rx);
        tokio::task::yield_now().await;

        // tick 与记录同时就绪
        tokio::time::advance(Duration::from_secs(1)).await;
        for d in [10, 20, 30] {
            tx.enqueue_timing(TimingRecord::new("GET", "/posts", 200, ms(d))).await;
        }
        while tx.queued() > 0 {
            tokio::task::yield_now().await;
        }
        shutdown_tx.send(true).unwrap();

        let stats = handle.await.unwrap();
        assert_eq!(stats.records_processed, 3);
        // 全部进入第一个窗口，关闭时没有剩余窗口
        assert_eq!(stats.windows_flushed, 1);
    }

    #[tokio::test]
    async fn test_run_exits_when_all_senders_dropped() {
        let (tx, rx) = timing_channel(16, OverflowPolicy::Block);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = RequestMetricsAggregator::new(rx, Duration::from_secs(60)).spawn(shutdown_rx);

        for d in [10, 20, 30] {
            tx.enqueue_timing(TimingRecord::new("GET", "/posts", 200, ms(d))).await;
        }
        drop(tx);

        let stats = handle.await.unwrap();
        assert_eq!(stats.records_processed, 3);
        assert_eq!(stats.windows_flushed, 1);
    }
}
