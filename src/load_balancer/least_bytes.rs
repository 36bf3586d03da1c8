//! Least-bytes load balancing strategy.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::load_balancer::{backend::Backend, LoadBalancer};

/// Least bytes selector.
/// Selects the healthy backend with the fewest response bytes relayed so far.
///
/// Candidates are keyed on `(bytes_processed, pool_index)` in a min-heap, so
/// equal loads resolve to the backend configured first.
#[derive(Debug, Default)]
pub struct LeastBytes;

impl LeastBytes {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for LeastBytes {
    fn next_server(&self, backends: &[Backend]) -> Option<usize> {
        let mut heap: BinaryHeap<Reverse<(u64, usize)>> = backends
            .iter()
            .enumerate()
            .filter(|(_, b)| b.is_healthy())
            .map(|(index, b)| Reverse((b.bytes_processed(), index)))
            .collect();

        heap.pop().map(|Reverse((_, index))| index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(state: &[(bool, u64)]) -> Vec<Backend> {
        state
            .iter()
            .enumerate()
            .map(|(i, &(healthy, bytes))| {
                let mut b = Backend::new(format!("server{}:8080", i + 1));
                b.set_healthy(healthy);
                b.record_bytes(bytes);
                b
            })
            .collect()
    }

    #[test]
    fn test_all_unhealthy_is_unavailable() {
        let backends = pool(&[(false, 10), (false, 20), (false, 30)]);
        assert_eq!(LeastBytes::new().next_server(&backends), None);
    }

    #[test]
    fn test_all_healthy_picks_minimum() {
        let backends = pool(&[(true, 10), (true, 20), (true, 30)]);
        assert_eq!(LeastBytes::new().next_server(&backends), Some(0));
    }

    #[test]
    fn test_skips_unhealthy_minimum() {
        let backends = pool(&[(false, 10), (true, 20), (true, 30)]);
        assert_eq!(LeastBytes::new().next_server(&backends), Some(1));
    }

    #[test]
    fn test_minimum_in_the_middle() {
        let backends = pool(&[(true, 10), (true, 5), (true, 30)]);
        assert_eq!(LeastBytes::new().next_server(&backends), Some(1));
    }

    #[test]
    fn test_ties_resolve_to_pool_order() {
        let backends = pool(&[(true, 40), (true, 7), (true, 7), (true, 7)]);
        assert_eq!(LeastBytes::new().next_server(&backends), Some(1));

        let backends = pool(&[(false, 0), (true, 0), (true, 0)]);
        assert_eq!(LeastBytes::new().next_server(&backends), Some(1));
    }

    #[test]
    fn test_empty_pool() {
        assert_eq!(LeastBytes::new().next_server(&[]), None);
    }
}
