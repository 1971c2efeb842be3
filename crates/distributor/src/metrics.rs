//! Distributor and port metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::Serialize;

/// Counters owned by one distributor
///
/// Only the distributor writes; monitors may read from any thread.
#[derive(Debug)]
pub struct DistributorMetrics {
    /// Messages routed to a single random port
    events_distributed: AtomicU64,
    /// Broadcast calls (one per registration, not per destination)
    events_registered: AtomicU64,
    /// Cumulative items passed through the streaming path
    sample_time: AtomicU64,
    /// Publishes the host refused
    publish_failures: AtomicU64,
    /// Messages handed to each output port, by index
    port_deliveries: Vec<AtomicU64>,
}

impl DistributorMetrics {
    /// Create metrics for `num_out_ports` output ports
    pub fn new(num_out_ports: usize) -> Self {
        Self {
            events_distributed: AtomicU64::new(0),
            events_registered: AtomicU64::new(0),
            sample_time: AtomicU64::new(0),
            publish_failures: AtomicU64::new(0),
            port_deliveries: (0..num_out_ports).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    pub fn events_distributed(&self) -> u64 {
        self.events_distributed.load(Ordering::Relaxed)
    }

    pub(crate) fn inc_events_distributed(&self) {
        self.events_distributed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn events_registered(&self) -> u64 {
        self.events_registered.load(Ordering::Relaxed)
    }

    pub(crate) fn inc_events_registered(&self) {
        self.events_registered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sample_time(&self) -> u64 {
        self.sample_time.load(Ordering::Relaxed)
    }

    pub(crate) fn advance_sample_time(&self, items: u64) {
        self.sample_time.fetch_add(items, Ordering::Relaxed);
    }

    pub fn publish_failures(&self) -> u64 {
        self.publish_failures.load(Ordering::Relaxed)
    }

    pub(crate) fn inc_publish_failures(&self) {
        self.publish_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Messages handed to port `index` so far
    pub fn port_deliveries(&self, index: usize) -> u64 {
        self.port_deliveries
            .get(index)
            .map_or(0, |c| c.load(Ordering::Relaxed))
    }

    pub(crate) fn inc_port_deliveries(&self, index: usize) {
        if let Some(counter) = self.port_deliveries.get(index) {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> DistributorSnapshot {
        DistributorSnapshot {
            events_distributed: self.events_distributed(),
            events_registered: self.events_registered(),
            sample_time: self.sample_time(),
            publish_failures: self.publish_failures(),
            port_deliveries: self
                .port_deliveries
                .iter()
                .map(|c| c.load(Ordering::Relaxed))
                .collect(),
        }
    }
}

/// Snapshot of distributor counters (for reporting)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DistributorSnapshot {
    pub events_distributed: u64,
    pub events_registered: u64,
    pub sample_time: u64,
    pub publish_failures: u64,
    pub port_deliveries: Vec<u64>,
}

/// Metrics for a single channel-backed output port
#[derive(Debug, Default)]
pub struct PortMetrics {
    /// Current queue length
    queue_len: AtomicUsize,
    /// Messages accepted by the queue
    published_count: AtomicU64,
    /// Messages dropped because the queue was full
    dropped_count: AtomicU64,
}

impl PortMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current queue length
    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    /// Set current queue length
    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn published_count(&self) -> u64 {
        self.published_count.load(Ordering::Relaxed)
    }

    pub fn inc_published_count(&self) {
        self.published_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    pub fn inc_dropped_count(&self) {
        self.dropped_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> PortSnapshot {
        PortSnapshot {
            queue_len: self.queue_len(),
            published_count: self.published_count(),
            dropped_count: self.dropped_count(),
        }
    }
}

/// Snapshot of port metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PortSnapshot {
    pub queue_len: usize,
    pub published_count: u64,
    pub dropped_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let metrics = DistributorMetrics::new(3);
        let snap = metrics.snapshot();
        assert_eq!(snap.events_distributed, 0);
        assert_eq!(snap.events_registered, 0);
        assert_eq!(snap.sample_time, 0);
        assert_eq!(snap.port_deliveries, vec![0, 0, 0]);
    }

    #[test]
    fn test_port_deliveries_out_of_range_is_ignored() {
        let metrics = DistributorMetrics::new(1);
        metrics.inc_port_deliveries(5);
        assert_eq!(metrics.port_deliveries(5), 0);
        assert_eq!(metrics.snapshot().port_deliveries, vec![0]);
    }
}
