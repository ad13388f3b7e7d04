//! Shared helpers for the integration suite: instance construction and a
//! brute-force reference solver used as ground truth for the
//! branch-and-bound engine's optimality.

use std::collections::{HashSet, VecDeque};

use knight_swap_core::instance::{AreaCorners, Instance, InstanceBuilder};
use knight_swap_core::square::Square;
use knight_swap_core::types::SquareType;

pub fn area(col1: i64, row1: i64, col2: i64, row2: i64) -> AreaCorners {
    AreaCorners {
        col1,
        row1,
        col2,
        row2,
    }
}

pub fn build(
    n_cols: u32,
    n_rows: u32,
    k: u32,
    white_area: AreaCorners,
    black_area: AreaCorners,
) -> Instance {
    InstanceBuilder::new(n_cols, n_rows, k, white_area, black_area)
        .build()
        .expect("valid instance")
}

/// A joint board state: the occupied-square bitmasks for each color plus the
/// move-parity `BoardState::whites_on_turn` keys off of. `whitesLeft` and
/// `blacksLeft` are always re-derivable from a mask via [`counters`], so they
/// aren't part of the key.
type StateKey = (u64, u64, u8);

fn counters(instance: &Instance, whites: u64, blacks: u64) -> (u32, u32) {
    let mut whites_left = 0u32;
    let mut blacks_left = 0u32;
    for p in 0..instance.n_squares as usize {
        let bit = 1u64 << p;
        let sq = Square::new(p as u16);
        if whites & bit != 0 && instance.square_type(sq) != SquareType::Black {
            whites_left += 1;
        }
        if blacks & bit != 0 && instance.square_type(sq) != SquareType::White {
            blacks_left += 1;
        }
    }
    (whites_left, blacks_left)
}

/// Exhaustive BFS over the full joint knight-placement state space,
/// returning the minimum number of moves to reach the goal (or `None` if
/// unreachable). This is the ground truth the branch-and-bound engine's
/// output length is checked against.
///
/// Intractable for large boards: the state count grows as
/// `C(nSquares, k) * C(nSquares - k, k)`, so this is only used on instances
/// small enough for that count to stay in the hundreds of thousands (up to
/// the 5x5/k=2 size used in this suite). Larger instances are instead
/// cross-checked by other means (see `end_to_end.rs`'s 6x6/k=3 scenario).
pub fn reference_optimal_length(instance: &Instance) -> Option<u32> {
    let n = instance.n_squares as usize;
    assert!(n <= 64, "reference solver keys positions into a u64 bitmask");

    let mut white_start = 0u64;
    let mut black_start = 0u64;
    for p in 0..n {
        let sq = Square::new(p as u16);
        match instance.square_type(sq) {
            SquareType::White => white_start |= 1u64 << p,
            SquareType::Black => black_start |= 1u64 << p,
            SquareType::Basic => {}
        }
    }

    let start: StateKey = (white_start, black_start, 0);
    let (wl0, bl0) = counters(instance, white_start, black_start);
    if wl0 == 0 && bl0 == 0 {
        return Some(0);
    }

    let mut visited: HashSet<StateKey> = HashSet::new();
    visited.insert(start);
    let mut queue: VecDeque<(StateKey, u32)> = VecDeque::new();
    queue.push_back((start, 0));

    while let Some(((whites, blacks, parity), depth)) = queue.pop_front() {
        let (whites_left, blacks_left) = counters(instance, whites, blacks);
        let whites_on_turn = (depth % 2 == 1 && whites_left > 0) || blacks_left == 0;

        let (mover, other) = if whites_on_turn {
            (whites, blacks)
        } else {
            (blacks, whites)
        };
        let occupied = mover | other;

        for from in 0..n {
            if mover & (1u64 << from) == 0 {
                continue;
            }
            for &to_sq in instance.moves_from(Square::new(from as u16)) {
                let to = to_sq.index();
                if occupied & (1u64 << to) != 0 {
                    continue;
                }
                let next_mover = (mover & !(1u64 << from)) | (1u64 << to);
                let (next_whites, next_blacks) = if whites_on_turn {
                    (next_mover, other)
                } else {
                    (other, next_mover)
                };
                let next_key: StateKey = (next_whites, next_blacks, 1 - parity);
                if !visited.insert(next_key) {
                    continue;
                }

                let next_depth = depth + 1;
                let (wl, bl) = counters(instance, next_whites, next_blacks);
                if wl == 0 && bl == 0 {
                    return Some(next_depth);
                }
                queue.push_back((next_key, next_depth));
            }
        }
    }

    None
}
