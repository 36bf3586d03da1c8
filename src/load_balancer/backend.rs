//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single backend server in the fixed pool
//! - Track liveness as last reported by the health monitor
//! - Track in-flight forwards and cumulative response bytes
//!
//! A `Backend` carries no synchronisation of its own. Every instance lives
//! inside the pool's `Mutex` and is only mutated through
//! [`BackendPool::with_lock`](crate::load_balancer::pool::BackendPool::with_lock).

/// A single backend server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    address: String,
    healthy: bool,
    in_flight: usize,
    bytes_processed: u64,
}

impl Backend {
    /// Create a new backend. It starts unhealthy until a probe confirms it.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            healthy: false,
            in_flight: 0,
            bytes_processed: 0,
        }
    }

    /// The backend address as host:port.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy
    }

    /// Number of forwards currently dispatched to this backend.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Cumulative response body bytes relayed through this backend.
    pub fn bytes_processed(&self) -> u64 {
        self.bytes_processed
    }

    /// Set the liveness flag. Returns true if the flag changed.
    pub fn set_healthy(&mut self, healthy: bool) -> bool {
        let changed = self.healthy != healthy;
        self.healthy = healthy;
        changed
    }

    /// Add relayed bytes. The counter never decreases.
    pub fn record_bytes(&mut self, bytes: u64) {
        self.bytes_processed = self.bytes_processed.saturating_add(bytes);
    }

    pub(crate) fn begin_dispatch(&mut self) {
        self.in_flight += 1;
    }

    pub(crate) fn end_dispatch(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }
}
