//! Backend pool management.
//!
//! # Responsibilities
//! - Own the fixed, ordered backend pool behind a single lock
//! - Apply the load balancing algorithm to select a backend
//! - Hand out dispatch guards that settle accounting when a forward ends
//!
//! # Design Decisions
//! - One coarse `std::sync::Mutex` for the whole pool; it is never held across
//!   an `.await`, so no network I/O happens under it
//! - A poisoned lock is recovered rather than propagated: every mutation is a
//!   single field write, so the data is never left half-updated

use std::sync::{Arc, Mutex, PoisonError};

use crate::config::BackendConfig;
use crate::load_balancer::{backend::Backend, least_bytes::LeastBytes, LoadBalancer};

/// The backend registry.
#[derive(Debug)]
pub struct BackendPool {
    backends: Mutex<Vec<Backend>>,
    balancer: Box<dyn LoadBalancer>,
}

impl BackendPool {
    /// Create a pool using the least-bytes algorithm.
    pub fn new<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_balancer(addresses, Box::new(LeastBytes::new()))
    }

    /// Create a pool with an explicit selection algorithm.
    pub fn with_balancer<I, S>(addresses: I, balancer: Box<dyn LoadBalancer>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let backends = addresses.into_iter().map(Backend::new).collect();
        Self {
            backends: Mutex::new(backends),
            balancer,
        }
    }

    /// Create a pool from configuration, preserving order.
    pub fn from_config(configs: &[BackendConfig]) -> Self {
        Self::new(configs.iter().map(|c| c.address.clone()))
    }

    /// Run `f` with exclusive access to the pool.
    ///
    /// The guard is released when `f` returns or unwinds.
    pub fn with_lock<R>(&self, f: impl FnOnce(&mut [Backend]) -> R) -> R {
        let mut backends = self
            .backends
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut backends)
    }

    pub fn len(&self) -> usize {
        self.with_lock(|b| b.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A point-in-time copy of every backend, in pool order.
    pub fn snapshot(&self) -> Vec<Backend> {
        self.with_lock(|b| b.to_vec())
    }

    /// Backend addresses in pool order.
    pub fn addresses(&self) -> Vec<String> {
        self.with_lock(|b| b.iter().map(|b| b.address().to_string()).collect())
    }

    /// Update one backend's liveness flag. Returns true on a transition.
    pub fn set_health(&self, index: usize, healthy: bool) -> bool {
        self.with_lock(|b| {
            b.get_mut(index)
                .map(|backend| backend.set_healthy(healthy))
                .unwrap_or(false)
        })
    }

    /// Run selection without dispatching.
    pub fn select(&self) -> Option<usize> {
        self.with_lock(|b| self.balancer.next_server(b))
    }

    /// Select a backend and mark a forward as started on it.
    ///
    /// Selection and the in-flight increment happen under one lock
    /// acquisition. Returns `None` when no backend is eligible.
    pub fn dispatch(self: &Arc<Self>) -> Option<Dispatch> {
        let (index, address) = self.with_lock(|b| {
            let index = self.balancer.next_server(b)?;
            let backend = &mut b[index];
            backend.begin_dispatch();
            Some((index, backend.address().to_string()))
        })?;

        Some(Dispatch {
            pool: Arc::clone(self),
            index,
            address,
            bytes: 0,
        })
    }
}

/// An in-progress forward to one backend.
///
/// Accumulates relayed bytes; when dropped it takes the pool lock once, adds
/// the bytes to the backend's counter and ends the dispatch.
#[derive(Debug)]
pub struct Dispatch {
    pool: Arc<BackendPool>,
    index: usize,
    address: String,
    bytes: u64,
}

impl Dispatch {
    /// Position of the chosen backend in the pool.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Address of the chosen backend.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Bytes counted so far.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn add_bytes(&mut self, bytes: u64) {
        self.bytes = self.bytes.saturating_add(bytes);
    }
}

impl Drop for Dispatch {
    fn drop(&mut self) {
        let (index, bytes) = (self.index, self.bytes);
        self.pool.with_lock(|b| {
            let backend = &mut b[index];
            backend.record_bytes(bytes);
            backend.end_dispatch();
        });
        tracing::trace!(backend = %self.address, bytes, "Dispatch settled");
    }
}
