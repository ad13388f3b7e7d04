//! Root splitting: BFS expansion near the search root to generate a pool of
//! independent sub-problems for distribution to workers (SPEC_FULL.md §4.6).

use std::collections::VecDeque;

use crate::board_state::BoardState;
use crate::instance::Instance;
use crate::search::candidate::generate_candidates;
use crate::search::global_state::GlobalState;
use crate::types::{SquareType, Step};

/// One sub-problem root: a board state paired with the step at which it occurs.
pub struct RootTask {
    pub state: BoardState,
    pub step: Step,
}

/// Expands `(initial_state, initial_step)` in BFS order, feeding goal states
/// into `global_state` along the way, until the queue holds at least
/// `min_roots` entries or is exhausted.
///
/// Mirrors the same child-generation and pruning logic as the recursive
/// search (`search::candidate::generate_candidates`), run iteratively rather
/// than recursively so the expansion can stop once enough roots exist.
pub fn split_roots(
    instance: &Instance,
    initial_state: BoardState,
    initial_step: Step,
    global_state: &GlobalState,
    min_roots: usize,
) -> Vec<RootTask> {
    let mut queue: VecDeque<RootTask> = VecDeque::new();
    queue.push_back(RootTask {
        state: initial_state,
        step: initial_step,
    });

    while queue.len() < min_roots {
        let Some(RootTask { state, step }) = queue.pop_front() else {
            break;
        };

        if state.is_goal() {
            global_state.try_adopt_solution(&state.moves);
        }

        let global_upper = global_state.upper_bound();
        let candidates = generate_candidates(instance, &state, step, global_upper);
        if candidates.is_empty() {
            // Dead end (or goal): nothing further to expand from here.
            continue;
        }

        let whites_on_turn = state.whites_on_turn(step);
        let color = if whites_on_turn {
            SquareType::White
        } else {
            SquareType::Black
        };

        for candidate in candidates {
            let mut child = state.clone();
            child.apply_move(
                instance,
                color,
                candidate.knight_index,
                candidate.to,
                candidate.next_lower_bound,
            );
            queue.push_back(RootTask {
                state: child,
                step: step + 1,
            });
        }
    }

    queue.into_iter().collect()
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
    fn test_split_produces_at_least_min_roots() {
        let inst = InstanceBuilder::new(6, 6, 3, area(0, 0, 0, 2), area(5, 3, 5, 5))
            .build()
            .unwrap();
        let state = BoardState::initial(&inst);
        let u0 = initial_upper_bound(&inst, &state);
        let gs = GlobalState::new(u0, state.lower_bound);

        let roots = split_roots(&inst, state, 0, &gs, 6);
        assert!(roots.len() >= 6 || roots.is_empty());
    }

    #[test]
    fn test_split_on_trivial_instance_terminates() {
        let inst = InstanceBuilder::new(3, 3, 1, area(0, 0, 0, 0), area(2, 2, 2, 2))
            .build()
            .unwrap();
        let state = BoardState::initial(&inst);
        let u0 = initial_upper_bound(&inst, &state);
        let gs = GlobalState::new(u0, state.lower_bound);
        // should terminate even if fewer than min_roots are reachable
        let _roots = split_roots(&inst, state, 0, &gs, 1000);
    }

    #[test]
    fn test_split_roots_all_consistent_with_step() {
        let inst = InstanceBuilder::new(4, 4, 1, area(0, 0, 0, 0), area(3, 3, 3, 3))
            .build()
            .unwrap();
        let state = BoardState::initial(&inst);
        let u0 = initial_upper_bound(&inst, &state);
        let gs = GlobalState::new(u0, state.lower_bound);
        let roots = split_roots(&inst, state, 0, &gs, 4);
        for root in &roots {
            assert_eq!(root.state.moves.len() as u32, root.step);
        }
    }
}
