//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all forwarding handler
//! - Wire up middleware (tracing, request ID)
//! - Start the health monitor alongside the listener
//! - Serve until the shutdown broadcast fires

use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, response::Response, routing::any, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::{HealthMode, ProxyConfig};
use crate::health::{HealthMonitor, Prober};
use crate::http::client::{build_client, UpstreamClient};
use crate::http::forward::Forwarder;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::response::ProxyError;
use crate::load_balancer::BackendPool;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Arc<Forwarder>,
}

/// HTTP front end of the load balancer.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    pool: Arc<BackendPool>,
    client: UpstreamClient,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Self {
        let pool = Arc::new(BackendPool::from_config(&config.backends));
        let client = build_client();
        let forwarder = Arc::new(Forwarder::new(pool.clone(), client.clone(), &config));

        let router = Self::build_router(AppState { forwarder });
        Self {
            router,
            config,
            pool,
            client,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(propagate_request_id_layer()),
            )
    }

    /// The backend registry, for inspection.
    pub fn pool(&self) -> Arc<BackendPool> {
        self.pool.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires.
    ///
    /// In background health mode the monitor is started here and stopped by
    /// the same signal.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backends = ?self.pool.addresses(),
            scheme = self.config.scheme(),
            trace = self.config.forwarding.trace,
            "HTTP server starting"
        );

        let monitor = match self.config.health_check.mode {
            HealthMode::Background => {
                let monitor = HealthMonitor::new(
                    self.pool.clone(),
                    Prober::from_config(self.client.clone(), &self.config),
                    self.config.health_check.interval(),
                );
                Some(tokio::spawn(monitor.run(shutdown.resubscribe())))
            }
            HealthMode::OnRequest => {
                tracing::info!("Health probes run before each selection");
                None
            }
        };

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        if let Some(handle) = monitor {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Health monitor task failed");
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Forwards every request to the selected backend.
async fn proxy_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Result<Response, ProxyError> {
    state.forwarder.forward(request).await
}
