//! Active health checking.
//!
//! # Responsibilities
//! - Run one repeating probe task per backend
//! - Update backend health state based on results
//! - Offer a one-shot sweep of the whole pool for per-request probing

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tokio::time::{self, MissedTickBehavior};

use crate::health::probe::Prober;
use crate::load_balancer::BackendPool;
use crate::observability::metrics;

pub struct HealthMonitor {
    pool: Arc<BackendPool>,
    prober: Prober,
    interval: Duration,
}

impl HealthMonitor {
    pub fn new(pool: Arc<BackendPool>, prober: Prober, interval: Duration) -> Self {
        Self {
            pool,
            prober,
            interval,
        }
    }

    /// Probe every backend on its own schedule until shutdown.
    ///
    /// The first tick of each task fires immediately, so every backend is
    /// probed once at startup.
    pub async fn run(self, shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval = ?self.interval,
            timeout = ?self.prober.timeout(),
            backends = self.pool.len(),
            "Health monitor starting"
        );

        let mut tasks = JoinSet::new();
        for (index, address) in self.pool.addresses().into_iter().enumerate() {
            tasks.spawn(watch_backend(
                self.pool.clone(),
                self.prober.clone(),
                index,
                address,
                self.interval,
                shutdown.resubscribe(),
            ));
        }
        drop(shutdown);

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Health check task failed");
            }
        }
        tracing::info!("Health monitor stopped");
    }
}

async fn watch_backend(
    pool: Arc<BackendPool>,
    prober: Prober,
    index: usize,
    address: String,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            _ = async {
                ticker.tick().await;
                check_backend(&pool, &prober, index, &address).await;
            } => {}
        }
    }
    tracing::debug!(backend = %address, "Health check task exiting");
}

/// Probe one backend and record the result under the pool lock.
pub async fn check_backend(pool: &BackendPool, prober: &Prober, index: usize, address: &str) -> bool {
    let result = prober.probe(address).await;
    let healthy = result.is_ok();

    let state = pool.with_lock(|b| {
        b.get_mut(index).map(|backend| {
            let changed = backend.set_healthy(healthy);
            (changed, backend.in_flight(), backend.bytes_processed())
        })
    });
    let Some((changed, in_flight, bytes_processed)) = state else {
        return false;
    };

    metrics::record_backend_health(address, healthy);

    match (&result, changed) {
        (Ok(()), true) => tracing::info!(backend = %address, "Backend is now healthy"),
        (Err(e), true) => tracing::warn!(backend = %address, error = %e, "Backend is now unhealthy"),
        (Err(e), false) => tracing::debug!(backend = %address, error = %e, "Health probe failed"),
        (Ok(()), false) => {}
    }
    tracing::debug!(
        backend = %address,
        healthy,
        in_flight,
        bytes_processed,
        "Health probe complete"
    );
    healthy
}

/// Probe the whole pool concurrently, then apply every result in one lock
/// acquisition. Returns the number of healthy backends.
pub async fn sweep(pool: &BackendPool, prober: &Prober) -> usize {
    let addresses = pool.addresses();
    let results = prober.probe_all(&addresses).await;

    let transitions = pool.with_lock(|b| {
        b.iter_mut()
            .zip(&results)
            .filter_map(|(backend, &healthy)| {
                backend
                    .set_healthy(healthy)
                    .then(|| (backend.address().to_string(), healthy))
            })
            .collect::<Vec<_>>()
    });

    for (address, healthy) in &transitions {
        if *healthy {
            tracing::info!(backend = %address, "Backend is now healthy");
        } else {
            tracing::warn!(backend = %address, "Backend is now unhealthy");
        }
    }
    for (address, healthy) in addresses.iter().zip(&results) {
        metrics::record_backend_health(address, *healthy);
    }

    results.iter().filter(|h| **h).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::client::build_client;

    fn dead_address() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_failed_probe_marks_unhealthy() {
        let address = dead_address();
        let pool = BackendPool::new([address.clone()]);
        pool.set_health(0, true);
        let prober = Prober::new(build_client(), "http", "/health", Duration::from_secs(1));

        assert!(!check_backend(&pool, &prober, 0, &address).await);
        assert!(!pool.snapshot()[0].is_healthy());
    }

    #[tokio::test]
    async fn test_sweep_marks_unreachable_unhealthy() {
        let pool = BackendPool::new([dead_address(), dead_address()]);
        pool.set_health(0, true);
        pool.set_health(1, true);
        let prober = Prober::new(build_client(), "http", "/health", Duration::from_secs(1));

        assert_eq!(sweep(&pool, &prober).await, 0);
        assert!(pool.snapshot().iter().all(|b| !b.is_healthy()));
    }

    #[tokio::test]
    async fn test_monitor_stops_on_shutdown() {
        let pool = Arc::new(BackendPool::new([dead_address()]));
        let prober = Prober::new(build_client(), "http", "/health", Duration::from_millis(200));
        let monitor = HealthMonitor::new(pool, prober, Duration::from_secs(60));

        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(monitor.run(rx));
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(()).unwrap();

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("monitor did not stop")
            .unwrap();
    }
}
