//! Timeout enforcement.
//!
//! # Responsibilities
//! - Fix a single deadline when a forward starts
//! - Bound both the upstream call and the response body stream by it
//!
//! # Design Decisions
//! - Uses Tokio's timer facilities; the deadline is absolute, so time spent
//!   waiting for headers is not granted again to the body
//! - Client disconnect drops the request future, which cancels whatever is
//!   waiting on the deadline at that moment

use std::future::Future;
use std::time::Duration;

use tokio::time::{self, Instant, Sleep};

/// An absolute deadline derived from a timeout.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
}

/// Returned when the deadline fires first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elapsed(pub Duration);

impl Deadline {
    /// A deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget,
        }
    }

    /// The original timeout this deadline was built from.
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// A timer that completes at the deadline.
    pub fn sleep(&self) -> Sleep {
        time::sleep_until(self.at)
    }

    /// Run `fut` until it completes or the deadline passes.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, Elapsed> {
        time::timeout_at(self.at, fut)
            .await
            .map_err(|_| Elapsed(self.budget))
    }
}
