//! Least-bytes HTTP load balancer
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────┐
//!                     │                LOAD BALANCER                  │
//!   Client Request    │  ┌─────────┐   ┌──────────┐   ┌────────────┐  │
//!   ──────────────────┼─▶│  http   │──▶│ forward  │──▶│ upstream   │──┼──▶ Backend
//!                     │  │ server  │   │  engine  │   │  client    │  │
//!                     │  └─────────┘   └────┬─────┘   └─────┬──────┘  │
//!                     │                     │ select        │         │
//!                     │                     ▼               │         │
//!                     │               ┌────────────┐        │         │
//!                     │               │   pool     │◀───────┘ bytes   │
//!                     │               │ (one lock) │                  │
//!                     │               └─────▲──────┘                  │
//!                     │                     │ healthy flags           │
//!                     │               ┌─────┴──────┐                  │
//!                     │               │  health    │─────────────────┼──▶ GET /health
//!                     │               │  monitor   │                  │
//!                     │               └────────────┘                  │
//!                     └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use tokio::net::TcpListener;

use least_bytes_lb::config::Args;
use least_bytes_lb::lifecycle::{spawn_signal_handler, Shutdown};
use least_bytes_lb::observability::{logging, metrics};
use least_bytes_lb::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Args::parse().into_config()?;

    logging::init_logging(&config.observability.log_level);
    tracing::info!("least-bytes-lb v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address(),
        request_timeout_secs = config.timeouts.request_secs,
        https = config.forwarding.https,
        "Configuration loaded"
    );
    tracing::info!("Tracing support enabled: {}", config.forwarding.trace);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(config.listener.bind_address()).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    spawn_signal_handler(shutdown);

    let server = HttpServer::new(config);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
