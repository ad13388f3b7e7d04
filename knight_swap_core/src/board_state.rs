//! Mutable per-search-node state.
//!
//! A [`BoardState`] is owned by exactly one search node. Recursive descent
//! clones the parent's state; there is no sharing of mutable node state
//! between sibling tasks (see the concurrency model in SPEC_FULL.md §5).

use arrayvec::ArrayVec;

use crate::constants::MAX_K;
use crate::instance::Instance;
use crate::square::Square;
use crate::types::{Dist, SquareType};
use crate::util::bitset::BitSet;

/// A single applied or candidate move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Move {
    pub from: Square,
    pub to: Square,
}

/// Mutable game-board state at one node of the search tree.
#[derive(Clone)]
pub struct BoardState {
    pub whites_left: u32,
    pub blacks_left: u32,
    pub whites: ArrayVec<Square, MAX_K>,
    pub blacks: ArrayVec<Square, MAX_K>,
    pub occupied: BitSet,
    pub lower_bound: Dist,
    pub moves: Vec<Move>,
}

impl BoardState {
    /// Builds the initial board state for `instance`: every knight on its
    /// starting square, `lower_bound` set to the admissible sum of
    /// per-knight distances (SPEC_FULL.md §4.2).
    pub fn initial(instance: &Instance) -> BoardState {
        let mut whites = ArrayVec::new();
        let mut blacks = ArrayVec::new();
        let mut occupied = BitSet::new(instance.n_squares as usize);

        for p in 0..instance.n_squares {
            let sq = Square::new(p as u16);
            match instance.square_type(sq) {
                SquareType::White => {
                    whites.push(sq);
                    occupied.set(sq.index());
                }
                SquareType::Black => {
                    blacks.push(sq);
                    occupied.set(sq.index());
                }
                SquareType::Basic => {}
            }
        }

        let mut lower_bound = 0;
        for &w in &whites {
            lower_bound += instance.dist_to_destination(SquareType::White, w);
        }
        for &b in &blacks {
            lower_bound += instance.dist_to_destination(SquareType::Black, b);
        }

        BoardState {
            whites_left: whites.len() as u32,
            blacks_left: blacks.len() as u32,
            whites,
            blacks,
            occupied,
            lower_bound,
            moves: Vec::new(),
        }
    }

    /// Reconstructs a `BoardState` from already-validated fields, e.g. ones
    /// deserialized from a [`BoardStateBlob`](crate::protocol::BoardStateBlob)
    /// received over the wire. The caller is responsible for having decoded
    /// `occupied` from the same bit layout `BitSet` uses internally.
    pub fn from_parts(
        whites_left: u32,
        blacks_left: u32,
        whites: &[Square],
        blacks: &[Square],
        occupied_bits: &[bool],
        lower_bound: Dist,
        moves: Vec<Move>,
    ) -> BoardState {
        let mut occupied = BitSet::new(occupied_bits.len());
        for (i, &bit) in occupied_bits.iter().enumerate() {
            if bit {
                occupied.set(i);
            }
        }
        BoardState {
            whites_left,
            blacks_left,
            whites: whites.iter().copied().collect(),
            blacks: blacks.iter().copied().collect(),
            occupied,
            lower_bound,
            moves,
        }
    }

    /// Whether every knight has reached its destination region.
    #[inline]
    pub fn is_goal(&self) -> bool {
        self.whites_left + self.blacks_left == 0
    }

    /// Whether whites move at this `step`, per the player-to-move rule in
    /// SPEC_FULL.md §4.4.
    #[inline]
    pub fn whites_on_turn(&self, step: u32) -> bool {
        (step % 2 == 1 && self.whites_left > 0) || self.blacks_left == 0
    }

    /// Applies a move for the knight of `color` at index `knight_index`,
    /// updating occupancy, position list, left-counters, lower bound, and
    /// the move list. `new_lower_bound` must be precomputed by the caller
    /// (the incremental update in SPEC_FULL.md §4.2).
    pub fn apply_move(
        &mut self,
        instance: &Instance,
        color: SquareType,
        knight_index: usize,
        to: Square,
        new_lower_bound: Dist,
    ) {
        let positions = match color {
            SquareType::White => &mut self.whites,
            SquareType::Black => &mut self.blacks,
            SquareType::Basic => unreachable!("Basic has no knights"),
        };
        let from = positions[knight_index];
        let destination_region = color.destination();

        let leaving_destination = instance.square_type(from) == destination_region;
        let entering_destination = instance.square_type(to) == destination_region;

        let left_counter = match color {
            SquareType::White => &mut self.whites_left,
            SquareType::Black => &mut self.blacks_left,
            SquareType::Basic => unreachable!(),
        };
        if leaving_destination {
            *left_counter += 1;
        }
        if entering_destination {
            *left_counter -= 1;
        }

        positions[knight_index] = to;
        self.occupied.reset(from.index());
        self.occupied.set(to.index());
        self.lower_bound = new_lower_bound;
        self.moves.push(Move { from, to });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{AreaCorners, InstanceBuilder};

    fn area(col1: i64, row1: i64, col2: i64, row2: i64) -> AreaCorners {
        AreaCorners {
            col1,
            row1,
            col2,
            row2,
        }
    }

    fn instance_4x4() -> Instance {
        InstanceBuilder::new(4, 4, 1, area(0, 0, 0, 0), area(3, 3, 3, 3))
            .build()
            .unwrap()
    }

    #[test]
    fn test_initial_invariants() {
        let inst = instance_4x4();
        let state = BoardState::initial(&inst);
        assert_eq!(state.occupied.count(), 2);
        assert_eq!(state.whites_left, 1);
        assert_eq!(state.blacks_left, 1);
        assert!(!state.is_goal());
        assert_eq!(state.lower_bound, 12); // 6 + 6, the 4x4 corner-to-corner distance
    }

    #[test]
    fn test_whites_on_turn_rule() {
        let inst = instance_4x4();
        let state = BoardState::initial(&inst);
        assert!(state.whites_on_turn(1));
        assert!(!state.whites_on_turn(2));
    }

    #[test]
    fn test_apply_move_updates_counters_and_occupancy() {
        let inst = instance_4x4();
        let mut state = BoardState::initial(&inst);
        let from = state.whites[0];
        let to = inst.moves_from(from)[0];
        let new_lb = state.lower_bound - inst.dist_to_destination(SquareType::White, from)
            + inst.dist_to_destination(SquareType::White, to);

        state.apply_move(&inst, SquareType::White, 0, to, new_lb);

        assert!(!state.occupied.test(from.index()));
        assert!(state.occupied.test(to.index()));
        assert_eq!(state.whites[0], to);
        assert_eq!(state.moves.len(), 1);
        assert_eq!(state.moves[0], Move { from, to });
        assert_eq!(state.occupied.count(), 2);
    }

    #[test]
    fn test_whites_left_decrements_on_reaching_destination() {
        // On a 4x4 with single knights, walk the white knight until it lands
        // on the black square; whites_left must drop to 0 there.
        let inst = instance_4x4();
        let mut state = BoardState::initial(&inst);
        let mut step = 1;
        while state.whites_left > 0 {
            let from = state.whites[0];
            let color = SquareType::White;
            let mut best: Option<(Square, Dist)> = None;
            for &to in inst.moves_from(from) {
                if state.occupied.test(to.index()) {
                    continue;
                }
                let d = inst.dist_to_destination(color, to);
                if best.is_none_or(|(_, bd)| d < bd) {
                    best = Some((to, d));
                }
            }
            let (to, _) = best.expect("4x4 single-knight puzzle is always solvable");
            let new_lb = state.lower_bound - inst.dist_to_destination(color, from)
                + inst.dist_to_destination(color, to);
            state.apply_move(&inst, color, 0, to, new_lb);
            step += 1;
            assert!(step < 20, "did not converge");
        }
        assert_eq!(state.whites_left, 0);
    }

    #[test]
    fn test_from_parts_matches_initial() {
        let inst = instance_4x4();
        let state = BoardState::initial(&inst);
        let occupied_bits: Vec<bool> = (0..state.occupied.len()).map(|i| state.occupied.test(i)).collect();
        let rebuilt = BoardState::from_parts(
            state.whites_left,
            state.blacks_left,
            &state.whites,
            &state.blacks,
            &occupied_bits,
            state.lower_bound,
            state.moves.clone(),
        );
        assert_eq!(rebuilt.whites_left, state.whites_left);
        assert_eq!(rebuilt.blacks_left, state.blacks_left);
        assert_eq!(rebuilt.whites.to_vec(), state.whites.to_vec());
        assert_eq!(rebuilt.lower_bound, state.lower_bound);
        assert_eq!(rebuilt.occupied, state.occupied);
    }
}
