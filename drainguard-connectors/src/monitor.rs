//! Source health counters shared between producer and observers

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};

use drainguard_core::{BoundedQueue, Reading, RiskType};
use serde::Serialize;

const NO_ANOMALY: u8 = u8::MAX;

/// Counters updated by the producer thread
#[derive(Debug)]
pub struct SourceMonitor {
    readings: AtomicU64,
    errors: AtomicU64,
    reconnects: AtomicU64,
    link_up: AtomicBool,
    running: AtomicBool,
    current_anomaly: AtomicU8,
}

impl Default for SourceMonitor {
    fn default() -> Self {
        Self {
            readings: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            reconnects: AtomicU64::new(0),
            link_up: AtomicBool::new(false),
            running: AtomicBool::new(false),
            current_anomaly: AtomicU8::new(NO_ANOMALY),
        }
    }
}

impl SourceMonitor {
    /// Queue a validated reading and count it
    pub fn publish(&self, queue: &BoundedQueue<Reading>, reading: Reading) {
        if queue.push(reading).is_some() {
            log::debug!("reading queue full, dropped oldest");
        }
        self.readings.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a rejected sample or record
    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a successful reconnect
    pub fn record_reconnect(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    /// Mark the link up or down
    pub fn set_link_up(&self, up: bool) {
        self.link_up.store(up, Ordering::Relaxed);
    }

    /// Mark the producer thread running or stopped
    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Relaxed);
    }

    /// Whether the producer thread is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Record the burst in progress, if any
    pub fn set_anomaly(&self, anomaly: Option<RiskType>) {
        let code = anomaly.map_or(NO_ANOMALY, RiskType::code);
        self.current_anomaly.store(code, Ordering::Relaxed);
    }

    /// Snapshot including the queue's depth and drop count
    pub fn snapshot(&self, queue: &BoundedQueue<Reading>) -> SourceStats {
        let current_anomaly = RiskType::from_code(self.current_anomaly.load(Ordering::Relaxed));
        SourceStats {
            readings: self.readings.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            dropped: queue.stats().dropped.load(Ordering::Relaxed),
            queue_depth: queue.len(),
            link_up: self.link_up.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
            anomaly_active: current_anomaly.is_some(),
            current_anomaly,
        }
    }
}

/// Copy of a source's counters at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceStats {
    /// Readings queued
    pub readings: u64,
    /// Samples or records rejected
    pub errors: u64,
    /// Readings dropped by the queue on overflow
    pub dropped: u64,
    /// Readings waiting in the queue
    pub queue_depth: usize,
    /// Link is up (always true for a running simulator)
    pub link_up: bool,
    /// Successful reconnects after a link failure
    pub reconnects: u64,
    /// A simulated anomaly burst is in progress
    pub anomaly_active: bool,
    /// Type of the burst in progress
    pub current_anomaly: Option<RiskType>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_queue() {
        let monitor = SourceMonitor::default();
        let queue = BoundedQueue::new(2);
        for gas in [100, 200, 300] {
            monitor.publish(&queue, Reading::now(40.0, gas));
        }
        monitor.record_error();
        monitor.set_anomaly(Some(RiskType::Leakage));

        let stats = monitor.snapshot(&queue);
        assert_eq!(stats.readings, 3);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.queue_depth, 2);
        assert!(stats.anomaly_active);
        assert_eq!(stats.current_anomaly, Some(RiskType::Leakage));

        monitor.set_anomaly(None);
        assert!(!monitor.snapshot(&queue).anomaly_active);
    }
}
