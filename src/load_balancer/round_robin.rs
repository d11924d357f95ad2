//! Round-robin rotation cursor.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared counter producing the next candidate index into the pool.
///
/// The stored value always stays in `[0, pool_size)`: each call hands out the
/// current value and atomically replaces it with its successor, wrapping to 0
/// instead of growing without bound. The cursor knows nothing about health.
#[derive(Debug, Default)]
pub struct RotationCursor {
    counter: AtomicUsize,
}

impl RotationCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the next index in `[0, pool_size)` and advance by one.
    pub fn next(&self, pool_size: NonZeroUsize) -> usize {
        let size = pool_size.get();
        let previous = self
            .counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(if current + 1 >= size { 0 } else { current + 1 })
            })
            .unwrap_or_else(|current| current);

        // Only reachable when one cursor is shared by pools of different sizes.
        previous % size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_round_robin() {
        let cursor = RotationCursor::new();
        let picks: Vec<usize> = (0..7).map(|_| cursor.next(size(3))).collect();
        assert_eq!(picks, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn test_single_backend_always_zero() {
        let cursor = RotationCursor::new();
        for _ in 0..5 {
            assert_eq!(cursor.next(size(1)), 0);
        }
    }

    #[test]
    fn test_stored_value_never_leaves_range() {
        let cursor = RotationCursor::new();
        for _ in 0..10_000 {
            cursor.next(size(4));
            assert!(cursor.counter.load(Ordering::Relaxed) < 4);
        }
    }

    #[test]
    fn test_concurrent_calls_hand_out_each_index_equally() {
        let cursor = Arc::new(RotationCursor::new());
        let threads = 8;
        let per_thread = 300;
        let pool = 3;

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let cursor = cursor.clone();
                thread::spawn(move || {
                    let mut counts = vec![0usize; pool];
                    for _ in 0..per_thread {
                        counts[cursor.next(size(pool))] += 1;
                    }
                    counts
                })
            })
            .collect();

        let mut totals = vec![0usize; pool];
        for handle in handles {
            for (i, count) in handle.join().unwrap().into_iter().enumerate() {
                totals[i] += count;
            }
        }

        // 2400 calls over 3 slots: no duplicates, no gaps.
        assert_eq!(totals, vec![800, 800, 800]);
        assert_eq!(cursor.next(size(pool)), 0);
    }
}
