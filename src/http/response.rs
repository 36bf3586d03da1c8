//! Response handling and transformation.
//!
//! # Responsibilities
//! - Map forwarding failures to client responses
//!
//! # Design Decisions
//! - Every failure before the backend's status line is relayed becomes a
//!   clean 503; there is no 502/504 distinction
//! - Failures after that point are body errors (see `body.rs`)

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// A forward that could not produce a backend response.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("no healthy backend available")]
    NoHealthyBackend,

    #[error("failed to reach backend {backend}: {source}")]
    Upstream {
        backend: String,
        #[source]
        source: hyper_util::client::legacy::Error,
    },

    #[error("backend {backend} did not respond within {after:?}")]
    Timeout { backend: String, after: Duration },

    #[error("failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
