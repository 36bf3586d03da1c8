//! Upstream HTTP client shared by forwarding and health probes.

use axum::body::Body;
use hyper_tls::HttpsConnector;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

/// Client able to reach backends over `http` or `https`.
pub type UpstreamClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Build the pooled upstream client.
pub fn build_client() -> UpstreamClient {
    Client::builder(TokioExecutor::new()).build(HttpsConnector::new())
}
