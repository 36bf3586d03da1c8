//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → pool.rs (take the pool lock)
//!     → Apply load balancing algorithm:
//!         - least_bytes.rs (healthy backend with fewest bytes relayed)
//!     → pool.rs (mark dispatch, release lock, hand out Dispatch guard)
//!     → Dispatch dropped after the response body → bytes recorded
//! ```
//!
//! # Design Decisions
//! - The algorithm is stateless; the pool owns all backend state
//! - Unhealthy backends excluded from selection
//! - Selection sees the pool under the same lock that records load, so
//!   concurrent requests observe each other's updates

pub mod backend;
pub mod least_bytes;
pub mod pool;

pub use backend::Backend;
pub use least_bytes::LeastBytes;
pub use pool::{BackendPool, Dispatch};

/// A backend selection algorithm.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Pick a backend by pool index, or `None` if none is eligible.
    fn next_server(&self, backends: &[Backend]) -> Option<usize>;
}
