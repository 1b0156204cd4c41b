//! Metrics registry
//!
//! Monotonic counters only, reset on process start. Relaxed atomics; the
//! values are exact but not ordered with respect to other memory.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters for governance activity
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    votes_cast: AtomicU64,
    votes_swapped: AtomicU64,
    votes_retracted: AtomicU64,
    votes_rejected: AtomicU64,
    transaction_conflicts: AtomicU64,
    deletions: AtomicU64,
    deletions_refused: AtomicU64,
    catalog_writes: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_votes_cast(&self) {
        self.votes_cast.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_votes_swapped(&self) {
        self.votes_swapped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_votes_retracted(&self) {
        self.votes_retracted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_votes_rejected(&self) {
        self.votes_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record conflicting commit attempts absorbed by a retry loop
    pub fn add_transaction_conflicts(&self, conflicts: u64) {
        self.transaction_conflicts.fetch_add(conflicts, Ordering::Relaxed);
    }

    pub fn increment_deletions(&self) {
        self.deletions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_deletions_refused(&self) {
        self.deletions_refused.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_catalog_writes(&self) {
        self.catalog_writes.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            votes_cast: self.votes_cast.load(Ordering::Relaxed),
            votes_swapped: self.votes_swapped.load(Ordering::Relaxed),
            votes_retracted: self.votes_retracted.load(Ordering::Relaxed),
            votes_rejected: self.votes_rejected.load(Ordering::Relaxed),
            transaction_conflicts: self.transaction_conflicts.load(Ordering::Relaxed),
            deletions: self.deletions.load(Ordering::Relaxed),
            deletions_refused: self.deletions_refused.load(Ordering::Relaxed),
            catalog_writes: self.catalog_writes.load(Ordering::Relaxed),
        }
    }

    /// Current counters as a JSON object
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub votes_cast: u64,
    pub votes_swapped: u64,
    pub votes_retracted: u64,
    pub votes_rejected: u64,
    pub transaction_conflicts: u64,
    pub deletions: u64,
    pub deletions_refused: u64,
    pub catalog_writes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_new_registry_is_zero() {
        assert_eq!(MetricsRegistry::new().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_concurrent_increments_are_exact() {
        let registry = Arc::new(MetricsRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for _ in 0..100 {
                        registry.increment_votes_cast();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.snapshot().votes_cast, 800);
    }

    #[test]
    fn test_to_json() {
        let registry = MetricsRegistry::new();
        registry.increment_deletions_refused();
        registry.add_transaction_conflicts(3);

        let parsed: serde_json::Value = serde_json::from_str(&registry.to_json()).unwrap();
        assert_eq!(parsed["deletions_refused"], 1);
        assert_eq!(parsed["transaction_conflicts"], 3);
    }
}
