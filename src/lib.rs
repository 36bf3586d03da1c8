//! Least-bytes HTTP load balancer library.
//!
//! Forwards every request to the healthy backend that has relayed the fewest
//! response bytes so far.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod resilience;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use load_balancer::BackendPool;
