//! Health probes.
//!
//! # Responsibilities
//! - Issue a single bounded `GET <scheme>://<address><path>`
//! - Classify the outcome: only a completed exchange with status 200 is healthy
//! - Fan a probe out to every backend and gather the results
//!
//! # Design Decisions
//! - Probes never touch the pool; callers apply results under the pool lock
//! - Other 2xx statuses count as failures

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use thiserror::Error;
use tokio::task::JoinSet;

use crate::config::ProxyConfig;
use crate::http::client::UpstreamClient;
use crate::resilience::Deadline;

/// Why a backend failed its probe.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection error: {0}")]
    Connect(#[from] hyper_util::client::legacy::Error),

    #[error("unexpected status {0}")]
    Status(StatusCode),

    #[error("invalid probe request: {0}")]
    Request(#[from] axum::http::Error),
}

/// Issues health probes against backends.
#[derive(Debug, Clone)]
pub struct Prober {
    client: UpstreamClient,
    scheme: &'static str,
    path: String,
    timeout: Duration,
}

impl Prober {
    pub fn new(
        client: UpstreamClient,
        scheme: &'static str,
        path: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            scheme,
            path: path.into(),
            timeout,
        }
    }

    pub fn from_config(client: UpstreamClient, config: &ProxyConfig) -> Self {
        Self::new(
            client,
            config.scheme(),
            config.health_check.path.clone(),
            config.probe_timeout(),
        )
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The probe URL for a backend.
    pub fn health_url(&self, address: &str) -> String {
        format!("{}://{}{}", self.scheme, address, self.path)
    }

    /// Probe one backend.
    pub async fn probe(&self, address: &str) -> Result<(), ProbeError> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(self.health_url(address))
            .header(header::USER_AGENT, "least-bytes-lb-health-check")
            .body(Body::empty())?;

        let response = tokio::time::timeout(self.timeout, self.client.request(request))
            .await
            .map_err(|_| ProbeError::Timeout(self.timeout))??;

        match response.status() {
            StatusCode::OK => Ok(()),
            status => Err(ProbeError::Status(status)),
        }
    }

    /// Probe every address concurrently and wait for all of them, or until
    /// the probe timeout elapses. Unreported backends count as failed.
    ///
    /// The result is indexed like `addresses`.
    pub async fn probe_all(&self, addresses: &[String]) -> Vec<bool> {
        let mut set = JoinSet::new();
        for (index, address) in addresses.iter().cloned().enumerate() {
            let prober = self.clone();
            set.spawn(async move {
                let result = prober.probe(&address).await;
                (index, address, result)
            });
        }

        let mut results = vec![false; addresses.len()];
        let gathered = Deadline::after(self.timeout)
            .run(async {
                while let Some(joined) = set.join_next().await {
                    match joined {
                        Ok((index, _, Ok(()))) => results[index] = true,
                        Ok((_, address, Err(e))) => {
                            tracing::debug!(backend = %address, error = %e, "Health probe failed");
                        }
                        Err(e) => tracing::error!(error = %e, "Health probe task failed"),
                    }
                }
            })
            .await;

        if gathered.is_err() {
            tracing::debug!(
                pending = set.len(),
                "Health probe sweep hit its deadline"
            );
            set.abort_all();
        }
        results
    }
}
