//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, catch-all route)
//!     → request.rs (add request ID)
//!     → forward.rs (select backend, rewrite, call with deadline)
//!     → body.rs (stream response, count bytes, settle dispatch)
//!     → response.rs (failures before headers → 503)
//!     → Send to client
//! ```

pub mod body;
pub mod client;
pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use body::{CountedBody, StreamError};
pub use forward::{Forwarder, LB_FROM};
pub use request::X_REQUEST_ID;
pub use response::ProxyError;
pub use server::HttpServer;
