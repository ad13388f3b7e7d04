//! Shared mutable state for a single worker's search (SPEC_FULL.md §4.5).
//!
//! `global_upper` is read without locking on the pruning fast path and only
//! ever decreases; `global_best` and `iteration_count` are guarded by the
//! same spinlock-backed critical section the teacher uses for split-point
//! bookkeeping (`crate::util::spinlock::RawSpinLock`).

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use lock_api::Mutex;

use crate::board_state::Move;
use crate::types::Dist;
use crate::util::spinlock::RawSpinLock;

type SpinMutex<T> = Mutex<RawSpinLock, T>;

/// Best solution found so far, plus the move count that earned it.
#[derive(Default, Clone)]
struct BestSolution {
    moves: Vec<Move>,
}

/// Shared state for one worker's search: the monotonically-shrinking
/// upper bound, the best solution found so far, and a progress counter.
pub struct GlobalState {
    upper: AtomicU32,
    best: SpinMutex<BestSolution>,
    iteration_count: AtomicU64,
    /// Set once `global_best.len() == init_lower_bound`; checked
    /// cooperatively by tasks at their spawn points (SPEC_FULL.md §4.5).
    cancelled: std::sync::atomic::AtomicBool,
    init_lower_bound: Dist,
}

impl GlobalState {
    pub fn new(initial_upper: Dist, init_lower_bound: Dist) -> Self {
        GlobalState {
            upper: AtomicU32::new(initial_upper),
            best: Mutex::new(BestSolution::default()),
            iteration_count: AtomicU64::new(0),
            cancelled: std::sync::atomic::AtomicBool::new(false),
            init_lower_bound,
        }
    }

    /// Fast-path read of the current upper bound, used for pruning.
    #[inline]
    pub fn upper_bound(&self) -> Dist {
        self.upper.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn increment_iterations(&self) {
        self.iteration_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn iteration_count(&self) -> u64 {
        self.iteration_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Adopts `candidate` as the new best solution if it still improves on
    /// the current upper bound, using double-checked locking: the caller's
    /// fast-path check is re-verified under the critical section before any
    /// mutation (SPEC_FULL.md §4.5).
    pub fn try_adopt_solution(&self, candidate: &[Move]) {
        let len = candidate.len() as Dist;
        if len >= self.upper_bound() {
            return;
        }

        let mut best = self.best.lock();
        if len >= self.upper.load(Ordering::Relaxed) {
            return;
        }

        best.moves = candidate.to_vec();
        self.upper.store(len, Ordering::Release);

        if len == self.init_lower_bound {
            self.cancelled.store(true, Ordering::Relaxed);
        }
    }

    /// Adopts an externally-reported upper bound (from a sibling worker or
    /// the coordinator) if it tightens the current one. Min-merge: safe
    /// regardless of message-arrival order (SPEC_FULL.md §5).
    pub fn try_tighten_upper_bound(&self, new_upper: Dist) {
        let mut current = self.upper.load(Ordering::Relaxed);
        while new_upper < current {
            match self.upper.compare_exchange_weak(
                current,
                new_upper,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    if new_upper == self.init_lower_bound {
                        self.cancelled.store(true, Ordering::Relaxed);
                    }
                    break;
                }
                Err(observed) => current = observed,
            }
        }
    }

    /// Snapshot of the best solution found so far (empty if none).
    pub fn best_solution(&self) -> Vec<Move> {
        self.best.lock().moves.clone()
    }
}
