//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::load_balancer::LoadBalancer;

/// Round-robin selector.
/// Stores an internal counter to rotate through targets.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalancer for RoundRobin {
    fn next_index(&self, len: usize) -> usize {
        assert!(len > 0, "round robin over an empty target set");

        // Single target: no shared write on the hot path
        if len == 1 {
            return 0;
        }

        self.counter.fetch_add(1, Ordering::Relaxed) % len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_round_robin() {
        let lb = RoundRobin::new();

        assert_eq!(lb.next_index(2), 0);
        assert_eq!(lb.next_index(2), 1);
        assert_eq!(lb.next_index(2), 0);
    }

    #[test]
    fn sequence_is_periodic() {
        let lb = RoundRobin::new();
        let picks: Vec<_> = (0..9).map(|_| lb.next_index(3)).collect();
        assert_eq!(picks, vec![0, 1, 2, 0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn single_target_leaves_cursor_alone() {
        let lb = RoundRobin::new();
        for _ in 0..5 {
            assert_eq!(lb.next_index(1), 0);
        }
        assert_eq!(lb.counter.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn concurrent_selection_is_fair() {
        let lb = Arc::new(RoundRobin::new());
        let k = 4;
        let per_thread = 1_000;
        let threads = 8;

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let lb = lb.clone();
                std::thread::spawn(move || {
                    let mut counts = vec![0usize; k];
                    for _ in 0..per_thread {
                        counts[lb.next_index(k)] += 1;
                    }
                    counts
                })
            })
            .collect();

        let mut totals = vec![0usize; k];
        for handle in handles {
            for (i, c) in handle.join().unwrap().into_iter().enumerate() {
                totals[i] += c;
            }
        }

        let n = threads * per_thread;
        for count in totals {
            assert!(count == n / k || count == n.div_ceil(k));
        }
    }

    #[test]
    #[should_panic]
    fn empty_target_set_is_a_bug() {
        RoundRobin::new().next_index(0);
    }
}
