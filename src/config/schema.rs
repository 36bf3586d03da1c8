//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the balancer.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the load balancer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind host, port).
    pub listener: ListenerConfig,

    /// The fixed, ordered backend pool.
    pub backends: Vec<BackendConfig>,

    /// Health check settings.
    pub health_check: HealthCheckConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Upstream forwarding behaviour.
    pub forwarding: ForwardingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ProxyConfig {
    /// The request timeout applied to every forwarded call.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.request_secs)
    }

    /// The probe timeout, falling back to the request timeout.
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(
            self.health_check
                .timeout_secs
                .unwrap_or(self.timeouts.request_secs),
        )
    }

    /// Scheme used to address backends.
    pub fn scheme(&self) -> &'static str {
        if self.forwarding.https {
            "https"
        } else {
            "http"
        }
    }

    /// Backend addresses in pool order.
    pub fn backend_addresses(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.address.clone()).collect()
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host or IP to bind (e.g., "0.0.0.0").
    pub bind_host: String,

    /// Port to listen on.
    pub port: u16,
}

impl ListenerConfig {
    /// Full bind address, e.g. "0.0.0.0:8090".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 8090,
        }
    }
}

/// Backend server configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct BackendConfig {
    /// Backend address as host:port (e.g., "server1:8080").
    pub address: String,
}

impl BackendConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

/// The pool used when neither the config file nor the CLI provide one.
pub fn default_backends() -> Vec<BackendConfig> {
    ["server1:8080", "server2:8080", "server3:8080"]
        .into_iter()
        .map(BackendConfig::new)
        .collect()
}

/// How backend liveness is kept current.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum HealthMode {
    /// One repeating probe task per backend.
    #[default]
    Background,
    /// Probe every backend concurrently before each selection.
    OnRequest,
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Probing strategy. Exactly one runs.
    pub mode: HealthMode,

    /// Health check interval in seconds.
    pub interval_secs: u64,

    /// Health check timeout in seconds. Falls back to `timeouts.request_secs`.
    pub timeout_secs: Option<u64>,

    /// Path to probe.
    pub path: String,
}

impl HealthCheckConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            mode: HealthMode::Background,
            interval_secs: 10,
            timeout_secs: None,
            path: "/health".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 3 }
    }
}

/// Forwarding configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Address backends over HTTPS instead of plain HTTP.
    pub https: bool,

    /// Add an `lb-from` header naming the backend that served the response.
    pub trace: bool,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
