//! Lock-free statistics using atomic operations
//!
//! Aggregated across all workers without mutex contention.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Process-wide keep-alive statistics
#[derive(Debug, Default)]
pub struct KeeperStats {
    pub sessions_established: AtomicU64,
    pub pings_sent: AtomicU64,
    pub pings_failed: AtomicU64,
    pub active_workers: AtomicU64,
    pub start_time: AtomicU64,
}

impl KeeperStats {
    /// Create new stats anchored at the current time
    pub fn new() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        Self {
            sessions_established: AtomicU64::new(0),
            pings_sent: AtomicU64::new(0),
            pings_failed: AtomicU64::new(0),
            active_workers: AtomicU64::new(0),
            start_time: AtomicU64::new(now),
        }
    }

    /// Record a successful session exchange
    pub fn record_session(&self) {
        self.sessions_established.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an accepted ping
    pub fn record_ping(&self) {
        self.pings_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed ping tick
    pub fn record_ping_failure(&self) {
        self.pings_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment active workers
    pub fn add_worker(&self) {
        self.active_workers.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrement active workers
    pub fn remove_worker(&self) {
        self.active_workers.fetch_sub(1, Ordering::Relaxed);
    }

    /// Get active worker count
    pub fn active_workers(&self) -> u64 {
        self.active_workers.load(Ordering::Relaxed)
    }

    /// Get accepted pings per hour since startup
    pub fn pings_per_hour(&self) -> f64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let start = self.start_time.load(Ordering::Relaxed);
        let elapsed_hours = now.saturating_sub(start) as f64 / 3600.0;

        if elapsed_hours < 0.001 {
            return 0.0;
        }

        self.pings_sent.load(Ordering::Relaxed) as f64 / elapsed_hours
    }

    /// Get snapshot for serialization
    pub fn snapshot(&self) -> KeeperStatsSnapshot {
        KeeperStatsSnapshot {
            sessions_established: self.sessions_established.load(Ordering::Relaxed),
            pings_sent: self.pings_sent.load(Ordering::Relaxed),
            pings_failed: self.pings_failed.load(Ordering::Relaxed),
            active_workers: self.active_workers.load(Ordering::Relaxed),
            pings_per_hour: self.pings_per_hour(),
        }
    }
}

/// Serializable snapshot of keeper stats
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeeperStatsSnapshot {
    pub sessions_established: u64,
    pub pings_sent: u64,
    pub pings_failed: u64,
    pub active_workers: u64,
    pub pings_per_hour: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = KeeperStats::new();
        stats.record_session();
        stats.record_ping();
        stats.record_ping();
        stats.record_ping_failure();
        stats.add_worker();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.sessions_established, 1);
        assert_eq!(snapshot.pings_sent, 2);
        assert_eq!(snapshot.pings_failed, 1);
        assert_eq!(snapshot.active_workers, 1);
    }

    #[test]
    fn test_worker_count_round_trips() {
        let stats = KeeperStats::new();
        stats.add_worker();
        stats.add_worker();
        stats.remove_worker();
        assert_eq!(stats.active_workers(), 1);
    }
}
