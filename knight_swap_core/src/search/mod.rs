//! Parallel branch-and-bound search engine.

pub mod bound;
pub mod candidate;
pub mod global_state;
pub mod root_splitter;
pub mod thread_pool;

use std::sync::Arc;

use crate::board_state::{BoardState, Move};
use crate::instance::Instance;
use crate::search::candidate::generate_candidates;
use crate::search::global_state::GlobalState;
use crate::search::thread_pool::ThreadPool;
use crate::types::{SquareType, Step};

/// How many levels of recursion beneath a task are still worth spawning as
/// separate pool jobs. Below this, the grain of work is too small to pay
/// for scheduling overhead and the search runs inline on the calling thread
/// (SPEC_FULL.md §4.5, §9 rewriting guidance).
const DEFAULT_PARALLEL_DEPTH_BUDGET: u32 = 3;

/// A raw pointer wrapper that is safe to send into a pool job because every
/// job spawned from `search_parallel` is guaranteed to finish executing
/// (via `ThreadPool::run_and_wait`'s blocking barrier) before the borrowed
/// `Instance` it points to can go out of scope.
struct InstancePtr(*const Instance);
unsafe impl Send for InstancePtr {}

impl InstancePtr {
    #[inline]
    unsafe fn get(&self) -> &Instance {
        unsafe { &*self.0 }
    }
}

/// Result of running the search to completion from one root.
pub struct SearchOutcome {
    pub best: Vec<Move>,
    pub iterations: u64,
}

/// Single-worker search engine: owns a thread pool and the shared state for
/// one assignment (SPEC_FULL.md §4.4/§4.5).
pub struct SearchWorker {
    pool: Arc<ThreadPool>,
}

impl SearchWorker {
    pub fn new(n_threads: usize) -> Self {
        SearchWorker {
            pool: ThreadPool::new(n_threads),
        }
    }

    /// Runs the branch-and-bound search from `state` at `step`, seeding
    /// `global_upper` as the initial ceiling, and returns the best solution
    /// found (empty if none).
    pub fn run(&self, instance: &Instance, state: BoardState, step: Step, global_upper: u32) -> SearchOutcome {
        let global = Arc::new(GlobalState::new(global_upper, state.lower_bound));
        search_parallel(
            instance,
            &global,
            &self.pool,
            state,
            step,
            DEFAULT_PARALLEL_DEPTH_BUDGET,
        );

        SearchOutcome {
            best: global.best_solution(),
            iterations: global.iteration_count(),
        }
    }

    /// Exposes the shared global state so a caller (e.g. the worker process
    /// loop) can drain `UpperBoundUpdate` messages into it while a search is
    /// in flight.
    pub fn run_with_shared_state(
        &self,
        instance: &Instance,
        state: BoardState,
        step: Step,
        global: Arc<GlobalState>,
    ) -> SearchOutcome {
        search_parallel(
            instance,
            &global,
            &self.pool,
            state,
            step,
            DEFAULT_PARALLEL_DEPTH_BUDGET,
        );
        SearchOutcome {
            best: global.best_solution(),
            iterations: global.iteration_count(),
        }
    }
}

/// Branch-and-bound descent that spawns each viable child as a pool job
/// while `depth_budget` remains, falling back to [`search_sequential`] once
/// the grain threshold is exhausted.
fn search_parallel(
    instance: &Instance,
    global: &Arc<GlobalState>,
    pool: &Arc<ThreadPool>,
    state: BoardState,
    step: Step,
    depth_budget: u32,
) {
    global.increment_iterations();

    if state.is_goal() {
        global.try_adopt_solution(&state.moves);
        return;
    }

    if global.is_cancelled() {
        return;
    }

    let candidates = generate_candidates(instance, &state, step, global.upper_bound());
    if candidates.is_empty() {
        return;
    }

    if depth_budget == 0 {
        search_sequential(instance, global, state, step);
        return;
    }

    let whites_on_turn = state.whites_on_turn(step);
    let color = if whites_on_turn {
        SquareType::White
    } else {
        SquareType::Black
    };

    let mut jobs: Vec<Box<dyn FnOnce() + Send>> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if global.is_cancelled() {
            break;
        }

        let mut child = state.clone();
        child.apply_move(
            instance,
            color,
            candidate.knight_index,
            candidate.to,
            candidate.next_lower_bound,
        );

        let instance_ptr = InstancePtr(instance);
        let global = global.clone();
        let pool_clone = pool.clone();
        // SAFETY: `instance` outlives the whole search (owned by the caller's
        // stack frame for the duration of `run`/`run_with_shared_state`),
        // and every spawned job is drained by `ThreadPool::run_and_wait`
        // before that frame returns.
        jobs.push(Box::new(move || {
            let instance = unsafe { instance_ptr.get() };
            search_parallel(instance, &global, &pool_clone, child, step + 1, depth_budget - 1);
        }));
    }

    pool.run_and_wait(jobs);
}

/// Single-threaded branch-and-bound descent, used beneath the grain
/// threshold to avoid pool overhead dominating small subtrees.
fn search_sequential(instance: &Instance, global: &GlobalState, state: BoardState, step: Step) {
    global.increment_iterations();

    if state.is_goal() {
        global.try_adopt_solution(&state.moves);
        return;
    }

    if global.is_cancelled() {
        return;
    }

    let candidates = generate_candidates(instance, &state, step, global.upper_bound());
    if candidates.is_empty() {
        return;
    }

    let whites_on_turn = state.whites_on_turn(step);
    let color = if whites_on_turn {
        SquareType::White
    } else {
        SquareType::Black
    };

    for candidate in candidates {
        if global.is_cancelled() {
            break;
        }

        let mut child = state.clone();
        child.apply_move(
            instance,
            color,
            candidate.knight_index,
            candidate.to,
            candidate.next_lower_bound,
        );
        search_sequential(instance, global, child, step + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{AreaCorners, InstanceBuilder};
    use crate::search::bound::initial_upper_bound;

    fn area(col1: i64, row1: i64, col2: i64, row2: i64) -> AreaCorners {
        AreaCorners {
            col1,
            row1,
            col2,
            row2,
        }
    }

    #[test]
    fn test_4x4_single_knight_optimum_is_six() {
        let inst = InstanceBuilder::new(4, 4, 1, area(0, 0, 0, 0), area(3, 3, 3, 3))
            .build()
            .unwrap();
        let state = BoardState::initial(&inst);
        let u0 = initial_upper_bound(&inst, &state);

        let worker = SearchWorker::new(2);
        let outcome = worker.run(&inst, state, 0, u0);

        assert_eq!(outcome.best.len(), 6);
    }

    #[test]
    fn test_3x3_unreachable_yields_empty_solution() {
        let inst = InstanceBuilder::new(3, 3, 1, area(0, 0, 0, 0), area(2, 2, 2, 2))
            .build()
            .unwrap();
        let state = BoardState::initial(&inst);
        let u0 = initial_upper_bound(&inst, &state);

        let worker = SearchWorker::new(2);
        let outcome = worker.run(&inst, state, 0, u0);

        assert!(outcome.best.is_empty());
    }

    #[test]
    fn test_solution_moves_are_legal() {
        let inst = InstanceBuilder::new(4, 4, 2, area(0, 0, 0, 1), area(3, 2, 3, 3))
            .build()
            .unwrap();
        let state = BoardState::initial(&inst);
        let u0 = initial_upper_bound(&inst, &state);

        let worker = SearchWorker::new(2);
        let outcome = worker.run(&inst, state, 0, u0);

        if !outcome.best.is_empty() {
            let mut occupied = vec![false; inst.n_squares as usize];
            for p in 0..inst.n_squares {
                let sq = crate::square::Square::new(p as u16);
                if inst.square_type(sq) != SquareType::Basic {
                    occupied[p as usize] = true;
                }
            }
            for mv in &outcome.best {
                assert!(occupied[mv.from.index()]);
                assert!(!occupied[mv.to.index()]);
                assert!(inst.moves_from(mv.from).contains(&mv.to));
                occupied[mv.from.index()] = false;
                occupied[mv.to.index()] = true;
            }
        }
    }
}
