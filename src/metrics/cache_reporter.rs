//! Periodic cache hit-rate reporting.

use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info};

use super::counters::{CacheCounters, CacheCountersSnapshot};

/// One derived report built from a single counter snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheReport {
    pub snapshot: CacheCountersSnapshot,
    pub user_hit_rate: f64,
    pub category_hit_rate: f64,
}

impl From<CacheCountersSnapshot> for CacheReport {
    fn from(snapshot: CacheCountersSnapshot) -> Self {
        Self {
            snapshot,
            user_hit_rate: snapshot.user_hit_rate(),
            category_hit_rate: snapshot.category_hit_rate(),
        }
    }
}

impl fmt::Display for CacheReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cache Metrics - User: {:.2}% hit rate ({} hits, {} misses), Category: {:.2}% hit rate ({} hits, {} misses)",
            self.user_hit_rate,
            self.snapshot.user_hits,
            self.snapshot.user_misses,
            self.category_hit_rate,
            self.snapshot.category_hits,
            self.snapshot.category_misses,
        )
    }
}

/// Background task that samples [`CacheCounters`] on a fixed period.
///
/// Stateless between ticks: every report only reads the registry.
pub struct CacheMetricsReporter {
    counters: Arc<CacheCounters>,
    period: Duration,
}

impl CacheMetricsReporter {
    pub fn new(counters: Arc<CacheCounters>, period: Duration) -> Self {
        Self { counters, period }
    }

    /// Take one snapshot and log it.
    pub fn report(&self) -> CacheReport {
        let report = CacheReport::from(self.counters.snapshot());
        info!(
            target: "iscogram::metrics::cache",
            user_hit_rate = report.user_hit_rate,
            user_hits = report.snapshot.user_hits,
            user_misses = report.snapshot.user_misses,
            category_hit_rate = report.category_hit_rate,
            category_hits = report.snapshot.category_hits,
            category_misses = report.snapshot.category_misses,
            "{}",
            report
        );
        report
    }

    /// Report every `period` until `shutdown` flips to `true` (or its sender
    /// is dropped). Returns the number of reports emitted.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> u64 {
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        debug!("Cache metrics reporter started, period: {:?}", self.period);

        let mut reports = 0;
        if *shutdown.borrow() {
            return reports;
        }

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.report();
                    reports += 1;
                }
            }
        }

        debug!("Cache metrics reporter stopped after {} reports", reports);
        reports
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<u64> {
        tokio::spawn(self.run(shutdown))
    }
}
