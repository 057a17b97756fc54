//! Request timing channel.
//!
//! One [`TimingRecord`] per completed HTTP request flows from the timing
//! middleware to the request metrics aggregator through a bounded channel.
//! What happens when the channel is full is decided by [`OverflowPolicy`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::trace;

pub use crate::config::OverflowPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingRecord {
    pub path: String,
    pub method: String,
    pub status: u16,
    pub duration: Duration,
}

impl TimingRecord {
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        status: u16,
        duration: Duration,
    ) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
            status,
            duration,
        }
    }

    /// Aggregation key, e.g. `"GET /posts"`.
    pub fn route_key(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// 入队结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Queued,
    /// Channel full under [`OverflowPolicy::Drop`].
    Dropped,
    /// Aggregator is gone; the record was discarded.
    Closed,
}

/// Producer half, cloned into every worker's middleware instance.
#[derive(Clone)]
pub struct TimingSender {
    tx: mpsc::Sender<TimingRecord>,
    policy: OverflowPolicy,
    dropped: Arc<AtomicU64>,
}

impl TimingSender {
    /// Never returns an error: overflow and a closed channel both degrade to
    /// losing the record. Only [`OverflowPolicy::Block`] can wait.
    pub async fn enqueue_timing(&self, record: TimingRecord) -> EnqueueOutcome {
        match self.policy {
            OverflowPolicy::Drop => match self.tx.try_send(record) {
                Ok(()) => EnqueueOutcome::Queued,
                Err(TrySendError::Full(record)) => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    trace!("Timing channel full, dropped {}", record.route_key());
                    EnqueueOutcome::Dropped
                }
                Err(TrySendError::Closed(_)) => EnqueueOutcome::Closed,
            },
            OverflowPolicy::Block => match self.tx.send(record).await {
                Ok(()) => EnqueueOutcome::Queued,
                Err(_) => EnqueueOutcome::Closed,
            },
        }
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    /// Records waiting in the channel.
    pub fn queued(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Records discarded because the channel was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Consumer half, owned by the aggregator task.
pub struct TimingReceiver {
    rx: mpsc::Receiver<TimingRecord>,
    dropped: Arc<AtomicU64>,
}

impl TimingReceiver {
    pub async fn recv(&mut self) -> Option<TimingRecord> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<TimingRecord> {
        self.rx.try_recv().ok()
    }

    pub fn dropped_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.dropped)
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Create the bounded request timing channel.
///
/// # Panics
/// If `capacity` is 0 (rejected earlier by config validation).
pub fn timing_channel(capacity: usize, policy: OverflowPolicy) -> (TimingSender, TimingReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    let dropped = Arc::new(AtomicU64::new(0));
    (
        TimingSender {
            tx,
            policy,
            dropped: Arc::clone(&dropped),
        },
        TimingReceiver { rx, dropped },
    )
}
