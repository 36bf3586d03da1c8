//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, intervals > 0)
//! - Reject malformed or duplicated backend addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("backend pool is empty")]
    EmptyPool,

    #[error("backend address '{0}' is not host:port")]
    InvalidAddress(String),

    #[error("backend address '{0}' appears more than once")]
    DuplicateAddress(String),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("health check path '{0}' must start with '/'")]
    InvalidHealthPath(String),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backends.is_empty() {
        errors.push(ValidationError::EmptyPool);
    }

    let mut seen = HashSet::new();
    for backend in &config.backends {
        if !is_host_port(&backend.address) {
            errors.push(ValidationError::InvalidAddress(backend.address.clone()));
        } else if !seen.insert(backend.address.as_str()) {
            errors.push(ValidationError::DuplicateAddress(backend.address.clone()));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroDuration("timeouts.request_secs"));
    }
    if config.health_check.interval_secs == 0 {
        errors.push(ValidationError::ZeroDuration("health_check.interval_secs"));
    }
    if config.health_check.timeout_secs == Some(0) {
        errors.push(ValidationError::ZeroDuration("health_check.timeout_secs"));
    }
    if !config.health_check.path.starts_with('/') {
        errors.push(ValidationError::InvalidHealthPath(
            config.health_check.path.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_host_port(address: &str) -> bool {
    match address.parse::<axum::http::uri::Authority>() {
        Ok(authority) => authority.port_u16().is_some() && !authority.host().is_empty(),
        Err(_) => false,
    }
}
