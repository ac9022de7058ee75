//! Hub metrics collection
//!
//! Counters written by the hub's control loop and read from anywhere through
//! a `HubHandle`.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Hub-level metrics (thread-safe)
#[derive(Debug, Default)]
pub struct HubMetrics {
    /// Housekeeping ticks since `run()` started
    ticks: AtomicU64,

    /// Current membership size
    members: AtomicUsize,

    /// Handles admitted
    registrations: AtomicU64,

    /// Handles removed by an unregister request
    unregistrations: AtomicU64,

    /// Broadcast payloads taken off the queue
    broadcasts: AtomicU64,

    /// Successful per-member sends
    deliveries: AtomicU64,

    /// Members removed after a failed or timed out send
    evictions: AtomicU64,

    /// Payloads rejected because the broadcast queue was full
    dropped: AtomicU64,

    /// Payloads still queued when the hub stopped
    discarded: AtomicU64,

    /// Wall-clock start of `run()`, unix millis
    started_at_ms: AtomicI64,

    running: AtomicBool,
}

impl HubMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn set_members(&self, count: usize) {
        self.members.store(count, Ordering::Relaxed);
    }

    pub fn inc_registrations(&self) {
        self.registrations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_unregistrations(&self) {
        self.unregistrations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_broadcasts(&self) {
        self.broadcasts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_deliveries(&self, count: u64) {
        self.deliveries.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_evictions(&self, count: u64) {
        self.evictions.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_discarded(&self, count: u64) {
        self.discarded.fetch_add(count, Ordering::Relaxed);
    }

    pub fn mark_started(&self) {
        self.started_at_ms
            .store(chrono::Utc::now().timestamp_millis(), Ordering::Relaxed);
        self.running.store(true, Ordering::Release);
    }

    pub fn mark_stopped(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Get snapshot for monitoring
    pub fn snapshot(&self, tick_interval: Duration) -> HubStats {
        let ticks = self.ticks();
        HubStats {
            running: self.is_running(),
            ticks,
            uptime_ms: (tick_interval.as_millis() as u64).saturating_mul(ticks),
            started_at_ms: self.started_at_ms.load(Ordering::Relaxed),
            members: self.members.load(Ordering::Relaxed),
            registrations: self.registrations.load(Ordering::Relaxed),
            unregistrations: self.unregistrations.load(Ordering::Relaxed),
            broadcasts: self.broadcasts.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot (serializable)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HubStats {
    pub running: bool,
    pub ticks: u64,
    /// Uptime as counted by housekeeping ticks
    pub uptime_ms: u64,
    /// Zero until the hub has started
    pub started_at_ms: i64,
    pub members: usize,
    pub registrations: u64,
    pub unregistrations: u64,
    pub broadcasts: u64,
    pub deliveries: u64,
    pub evictions: u64,
    pub dropped: u64,
    pub discarded: u64,
}
