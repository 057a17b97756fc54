use std::sync::atomic::{AtomicU64, Ordering};

use crate::cache::CacheKind;

/// Cache hit/miss counters, one pair per [`CacheKind`].
///
/// Increment-only. Each counter is atomic on its own; a snapshot may show
/// slight skew between counters, which is fine for computing hit rates.
#[derive(Debug, Default)]
pub struct CacheCounters {
    user_hits: AtomicU64,
    user_misses: AtomicU64,
    category_hits: AtomicU64,
    category_misses: AtomicU64,
}

impl CacheCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self, kind: CacheKind) {
        match kind {
            CacheKind::User => self.user_hits.fetch_add(1, Ordering::Relaxed),
            CacheKind::Category => self.category_hits.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn record_miss(&self, kind: CacheKind) {
        match kind {
            CacheKind::User => self.user_misses.fetch_add(1, Ordering::Relaxed),
            CacheKind::Category => self.category_misses.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn snapshot(&self) -> CacheCountersSnapshot {
        CacheCountersSnapshot {
            user_hits: self.user_hits.load(Ordering::Relaxed),
            user_misses: self.user_misses.load(Ordering::Relaxed),
            category_hits: self.category_hits.load(Ordering::Relaxed),
            category_misses: self.category_misses.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheCountersSnapshot {
    pub user_hits: u64,
    pub user_misses: u64,
    pub category_hits: u64,
    pub category_misses: u64,
}

impl CacheCountersSnapshot {
    pub fn hits(&self, kind: CacheKind) -> u64 {
        match kind {
            CacheKind::User => self.user_hits,
            CacheKind::Category => self.category_hits,
        }
    }

    pub fn misses(&self, kind: CacheKind) -> u64 {
        match kind {
            CacheKind::User => self.user_misses,
            CacheKind::Category => self.category_misses,
        }
    }

    /// Hit rate in percent, 0 when nothing was looked up yet.
    pub fn hit_rate(&self, kind: CacheKind) -> f64 {
        hit_rate(self.hits(kind), self.misses(kind))
    }

    pub fn user_hit_rate(&self) -> f64 {
        self.hit_rate(CacheKind::User)
    }

    pub fn category_hit_rate(&self) -> f64 {
        self.hit_rate(CacheKind::Category)
    }
}

pub fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits.saturating_add(misses);
    if total == 0 {
        return 0.0;
    }
    hits as f64 / total as f64 * 100.0
}
