//! Cache and request metrics.
//!
//! - `counters`: atomic hit/miss registry shared with the object cache
//! - `cache_reporter`: periodic hit-rate report
//! - `timing`: bounded channel fed by the timing middleware
//! - `aggregator`: per-route count/avg/max per window

pub mod aggregator;
pub mod cache_reporter;
pub mod counters;
pub mod timing;

pub use aggregator::{AggregatorStats, RequestMetricsAggregator, RouteAggregates, RouteSummary};
pub use cache_reporter::{CacheMetricsReporter, CacheReport};
pub use counters::{CacheCounters, CacheCountersSnapshot, hit_rate};
pub use timing::{
    EnqueueOutcome, OverflowPolicy, TimingReceiver, TimingRecord, TimingSender, timing_channel,
};
