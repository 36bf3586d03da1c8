//! Request forwarding.
//!
//! # Responsibilities
//! - Select a backend and mark the dispatch (one lock acquisition)
//! - Rewrite the inbound request for that backend
//! - Issue it once, bounded by the request deadline
//! - Relay status and headers, stream the body through a byte counter
//!
//! # Design Decisions
//! - Single attempt: no retries, no failover to another backend
//! - Dropping the handler future (client went away) drops the upstream call
//! - Bytes are recorded when the body settles, not when headers arrive

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{
    header,
    uri::{PathAndQuery, Scheme},
    HeaderName, HeaderValue, Request, Response, Uri, Version,
};

use crate::config::{HealthMode, ProxyConfig};
use crate::health::{sweep, Prober};
use crate::http::body::CountedBody;
use crate::http::client::UpstreamClient;
use crate::http::request::request_id;
use crate::http::response::ProxyError;
use crate::load_balancer::BackendPool;
use crate::observability::metrics;
use crate::resilience::{Deadline, Elapsed};

/// Response header naming the backend that served the request.
pub const LB_FROM: HeaderName = HeaderName::from_static("lb-from");

/// The forwarding engine.
#[derive(Debug, Clone)]
pub struct Forwarder {
    pool: Arc<BackendPool>,
    client: UpstreamClient,
    scheme: Scheme,
    timeout: Duration,
    trace: bool,
    per_request_probe: Option<Prober>,
}

impl Forwarder {
    pub fn new(pool: Arc<BackendPool>, client: UpstreamClient, config: &ProxyConfig) -> Self {
        let per_request_probe = match config.health_check.mode {
            HealthMode::Background => None,
            HealthMode::OnRequest => Some(Prober::from_config(client.clone(), config)),
        };

        Self {
            pool,
            client,
            scheme: if config.forwarding.https {
                Scheme::HTTPS
            } else {
                Scheme::HTTP
            },
            timeout: config.request_timeout(),
            trace: config.forwarding.trace,
            per_request_probe,
        }
    }

    /// Forward one request to the least loaded healthy backend.
    pub async fn forward(&self, request: Request<Body>) -> Result<Response<Body>, ProxyError> {
        let start = Instant::now();
        let method = request.method().to_string();
        let request_id = request_id(&request).to_string();

        if let Some(prober) = &self.per_request_probe {
            sweep(&self.pool, prober).await;
        }

        let Some(dispatch) = self.pool.dispatch() else {
            tracing::warn!(request_id = %request_id, "No healthy backends");
            metrics::record_request(&method, 503, "none", start);
            return Err(ProxyError::NoHealthyBackend);
        };

        let backend = dispatch.address().to_string();
        let upstream = self.rewrite(request, &backend)?;
        let uri = upstream.uri().clone();

        let deadline = Deadline::after(self.timeout);
        let response = match deadline.run(self.client.request(upstream)).await {
            Ok(Ok(response)) => response,
            Ok(Err(source)) => {
                tracing::error!(
                    request_id = %request_id,
                    backend = %backend,
                    error = %source,
                    "Failed to get response from backend"
                );
                metrics::record_request(&method, 503, &backend, start);
                return Err(ProxyError::Upstream { backend, source });
            }
            Err(Elapsed(after)) => {
                tracing::error!(
                    request_id = %request_id,
                    backend = %backend,
                    timeout = ?after,
                    "Backend timed out"
                );
                metrics::record_request(&method, 503, &backend, start);
                return Err(ProxyError::Timeout { backend, after });
            }
        };

        let (mut parts, body) = response.into_parts();
        if self.trace {
            match HeaderValue::from_str(&backend) {
                Ok(value) => {
                    parts.headers.insert(LB_FROM, value);
                }
                Err(e) => tracing::warn!(backend = %backend, error = %e, "Cannot encode lb-from header"),
            }
        }

        tracing::info!(
            request_id = %request_id,
            status = parts.status.as_u16(),
            uri = %uri,
            "fwd"
        );
        metrics::record_request(&method, parts.status.as_u16(), &backend, start);

        let body = Body::new(CountedBody::new(body, dispatch, deadline));
        Ok(Response::from_parts(parts, body))
    }

    /// Point the request at `address`, keeping method, path, query, headers
    /// and body.
    fn rewrite(&self, request: Request<Body>, address: &str) -> Result<Request<Body>, ProxyError> {
        let (mut parts, body) = request.into_parts();

        let path_and_query = parts
            .uri
            .path_and_query()
            .cloned()
            .unwrap_or_else(|| PathAndQuery::from_static("/"));
        parts.uri = Uri::builder()
            .scheme(self.scheme.clone())
            .authority(address)
            .path_and_query(path_and_query)
            .build()?;

        let host = HeaderValue::from_str(address).map_err(axum::http::Error::from)?;
        parts.headers.insert(header::HOST, host);
        parts.version = Version::HTTP_11;

        Ok(Request::from_parts(parts, body))
    }
}
