//! Command line flags.
//!
//! Flags are layered over the config file (or the built-in defaults when no
//! file is given). Any flag that is present wins.

use std::path::PathBuf;

use clap::Parser;

use crate::config::loader::{read_config, ConfigError};
use crate::config::schema::{default_backends, BackendConfig, ProxyConfig};
use crate::config::validation::validate_config;

#[derive(Debug, Parser)]
#[command(name = "least-bytes-lb")]
#[command(about = "HTTP load balancer routing to the healthy backend with the least bytes served", long_about = None)]
pub struct Args {
    /// Optional TOML config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Listening port.
    #[arg(long)]
    pub port: Option<u16>,

    /// Request timeout in seconds.
    #[arg(long = "timeout-sec")]
    pub timeout_sec: Option<u64>,

    /// Address backends over HTTPS.
    #[arg(long)]
    pub https: bool,

    /// Include the `lb-from` header in responses.
    #[arg(long)]
    pub trace: bool,

    /// Backend address (host:port). Repeat to build the pool; replaces the configured pool.
    #[arg(long = "backend", value_name = "ADDR")]
    pub backends: Vec<String>,

    /// Log level used when RUST_LOG is not set.
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Args {
    /// Resolve the final, validated configuration.
    pub fn into_config(self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => ProxyConfig {
                backends: default_backends(),
                ..ProxyConfig::default()
            },
        };
        self.apply(&mut config);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }

    fn apply(self, config: &mut ProxyConfig) {
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(secs) = self.timeout_sec {
            config.timeouts.request_secs = secs;
        }
        if self.https {
            config.forwarding.https = true;
        }
        if self.trace {
            config.forwarding.trace = true;
        }
        if !self.backends.is_empty() {
            config.backends = self.backends.into_iter().map(BackendConfig::new).collect();
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
    }
}
