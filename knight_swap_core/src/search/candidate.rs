//! Candidate move generation: the child-generation and ordering rules of
//! SPEC_FULL.md §4.4.

use crate::board_state::BoardState;
use crate::instance::Instance;
use crate::square::Square;
use crate::types::{Dist, SquareType};

/// A single viable next move, with its resulting lower bound precomputed.
#[derive(Clone, Copy, Debug)]
pub struct Candidate {
    pub next_lower_bound: Dist,
    pub knight_index: usize,
    pub from: Square,
    pub to: Square,
}

/// Generates and orders every legal, non-pruned candidate move from `state`
/// at `step`, per SPEC_FULL.md §4.4's child-generation and ordering rules.
pub fn generate_candidates(
    instance: &Instance,
    state: &BoardState,
    step: u32,
    global_upper: Dist,
) -> Vec<Candidate> {
    let whites_on_turn = state.whites_on_turn(step);
    let (color, knights): (SquareType, &[Square]) = if whites_on_turn {
        (SquareType::White, &state.whites)
    } else {
        (SquareType::Black, &state.blacks)
    };

    let mut candidates = Vec::new();
    for (i, &from) in knights.iter().enumerate() {
        let from_dist = instance.dist_to_destination(color, from);
        for &to in instance.moves_from(from) {
            if state.occupied.test(to.index()) {
                continue;
            }
            let to_dist = instance.dist_to_destination(color, to);
            let next_lower_bound = state.lower_bound - from_dist + to_dist;

            if step + next_lower_bound + 1 >= global_upper {
                continue;
            }

            candidates.push(Candidate {
                next_lower_bound,
                knight_index: i,
                from,
                to,
            });
        }
    }

    candidates.sort_by_key(|c| c.next_lower_bound);
    candidates
}
