//! Immutable, precomputed per-instance tables.
//!
//! An [`Instance`] is built once from the parsed input file and then shared
//! read-only across every search thread and every worker process for the
//! remainder of the run.

use std::collections::VecDeque;

use crate::error::{KnightSwapError, Result};
use crate::square::Square;
use crate::types::{Dist, SquareType};

/// Two opposite corners of a rectangular area, given as `(col, row)` pairs.
///
/// The corners need not be given min-then-max; [`InstanceBuilder`] normalizes them.
#[derive(Clone, Copy, Debug)]
pub struct AreaCorners {
    pub col1: i64,
    pub row1: i64,
    pub col2: i64,
    pub row2: i64,
}

impl AreaCorners {
    /// Normalizes so that `(col1, row1)` is the top-left corner.
    fn normalized(self) -> Self {
        let (row1, row2) = if self.row2 < self.row1 {
            (self.row2, self.row1)
        } else {
            (self.row1, self.row2)
        };
        let (col1, col2) = if self.col2 < self.col1 {
            (self.col2, self.col1)
        } else {
            (self.col1, self.col2)
        };
        AreaCorners {
            col1,
            row1,
            col2,
            row2,
        }
    }

    fn contains(&self, row: i64, col: i64) -> bool {
        row >= self.row1 && row <= self.row2 && col >= self.col1 && col <= self.col2
    }

    fn area(&self) -> i64 {
        (self.row2 - self.row1 + 1) * (self.col2 - self.col1 + 1)
    }
}

/// Immutable precomputed tables describing the board and its knight-move graph.
pub struct Instance {
    pub n_cols: u32,
    pub n_rows: u32,
    pub n_squares: u32,
    /// Number of knights per side.
    pub k: u32,
    square_type: Vec<SquareType>,
    /// `moves[p]` — squares reachable from `p` by a single knight hop.
    moves: Vec<Vec<Square>>,
    /// Minimum knight-hops from `p` to the nearest Black square (used by white knights).
    dist_to_black: Vec<Dist>,
    /// Minimum knight-hops from `p` to the nearest White square (used by black knights).
    dist_to_white: Vec<Dist>,
}

const KNIGHT_OFFSETS: [(i32, i32); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

impl Instance {
    /// Reconstructs an `Instance` from already-validated precomputed tables,
    /// e.g. ones deserialized from an [`InstanceBlob`](crate::protocol::InstanceBlob)
    /// received over the wire by a worker process. Unlike [`InstanceBuilder::build`],
    /// this performs no validation: the sender is trusted to have validated
    /// the instance before serializing it.
    pub fn from_tables(
        n_cols: u32,
        n_rows: u32,
        k: u32,
        square_type: Vec<SquareType>,
        moves: Vec<Vec<Square>>,
        dist_to_black: Vec<Dist>,
        dist_to_white: Vec<Dist>,
    ) -> Instance {
        let n_squares = n_cols * n_rows;
        Instance {
            n_cols,
            n_rows,
            n_squares,
            k,
            square_type,
            moves,
            dist_to_black,
            dist_to_white,
        }
    }

    /// Squares reachable from `p` by a single knight hop.
    #[inline]
    pub fn moves_from(&self, p: Square) -> &[Square] {
        &self.moves[p.index()]
    }

    /// The classification of square `p`.
    #[inline]
    pub fn square_type(&self, p: Square) -> SquareType {
        self.square_type[p.index()]
    }

    /// Minimum knight-hop distance from `p` to the destination region of color `color`.
    ///
    /// `color` names the knight's own color: a white knight's distance table is
    /// `dist_to_black`, since Black is white's destination region.
    #[inline]
    pub fn dist_to_destination(&self, color: SquareType, p: Square) -> Dist {
        match color {
            SquareType::White => self.dist_to_black[p.index()],
            SquareType::Black => self.dist_to_white[p.index()],
            SquareType::Basic => unreachable!("Basic squares have no knights"),
        }
    }
}

/// Builds an [`Instance`] from board dimensions, knight count, and the two area rectangles.
pub struct InstanceBuilder {
    n_cols: u32,
    n_rows: u32,
    k: u32,
    white_area: AreaCorners,
    black_area: AreaCorners,
}

impl InstanceBuilder {
    pub fn new(
        n_cols: u32,
        n_rows: u32,
        k: u32,
        white_area: AreaCorners,
        black_area: AreaCorners,
    ) -> Self {
        InstanceBuilder {
            n_cols,
            n_rows,
            k,
            white_area: white_area.normalized(),
            black_area: black_area.normalized(),
        }
    }

    /// Validates and builds the instance.
    pub fn build(self) -> Result<Instance> {
        if self.n_cols == 0 || self.n_rows == 0 {
            return Err(KnightSwapError::Instance(
                "board dimensions must be positive".to_string(),
            ));
        }
        if self.k == 0 {
            return Err(KnightSwapError::Instance(
                "k (knights per side) must be positive".to_string(),
            ));
        }
        if self.k as usize > crate::constants::MAX_K {
            return Err(KnightSwapError::Instance(format!(
                "k ({}) exceeds the maximum supported knights per side ({})",
                self.k,
                crate::constants::MAX_K
            )));
        }

        let n_rows_i = self.n_rows as i64;
        let n_cols_i = self.n_cols as i64;
        for area in [&self.white_area, &self.black_area] {
            if area.row1 < 0 || area.col1 < 0 || area.row2 >= n_rows_i || area.col2 >= n_cols_i {
                return Err(KnightSwapError::Instance(
                    "area is not fully on the board".to_string(),
                ));
            }
        }
        if self.white_area.area() != self.k as i64 || self.black_area.area() != self.k as i64 {
            return Err(KnightSwapError::Instance(format!(
                "area size must equal k ({}); got white={}, black={}",
                self.k,
                self.white_area.area(),
                self.black_area.area()
            )));
        }

        let n_squares = self.n_rows * self.n_cols;
        let square_type = self.build_square_type();
        let moves = self.build_moves();
        let dist_to_black = bfs_distances(&moves, &square_type, SquareType::Black);
        let dist_to_white = bfs_distances(&moves, &square_type, SquareType::White);

        Ok(Instance {
            n_cols: self.n_cols,
            n_rows: self.n_rows,
            n_squares,
            k: self.k,
            square_type,
            moves,
            dist_to_black,
            dist_to_white,
        })
    }

    fn build_square_type(&self) -> Vec<SquareType> {
        let mut res = Vec::with_capacity((self.n_rows * self.n_cols) as usize);
        for row in 0..self.n_rows as i64 {
            for col in 0..self.n_cols as i64 {
                if self.white_area.contains(row, col) {
                    res.push(SquareType::White);
                } else if self.black_area.contains(row, col) {
                    res.push(SquareType::Black);
                } else {
                    res.push(SquareType::Basic);
                }
            }
        }
        res
    }

    fn build_moves(&self) -> Vec<Vec<Square>> {
        let mut res = Vec::with_capacity((self.n_rows * self.n_cols) as usize);
        for row in 0..self.n_rows as i32 {
            for col in 0..self.n_cols as i32 {
                let mut dests = Vec::new();
                for &(dr, dc) in &KNIGHT_OFFSETS {
                    let new_row = row + dr;
                    let new_col = col + dc;
                    if new_row >= 0
                        && new_row < self.n_rows as i32
                        && new_col >= 0
                        && new_col < self.n_cols as i32
                    {
                        dests.push(Square::from_row_col(
                            new_row as u16,
                            new_col as u16,
                            self.n_cols as u16,
                        ));
                    }
                }
                res.push(dests);
            }
        }
        res
    }
}

/// BFS, from every square, to the nearest square of type `target`.
fn bfs_distances(
    moves: &[Vec<Square>],
    square_type: &[SquareType],
    target: SquareType,
) -> Vec<Dist> {
    let n = moves.len();
    let mut dist = vec![crate::types::DIST_UNREACHABLE; n];

    for start in 0..n {
        if square_type[start] == target {
            dist[start] = 0;
            continue;
        }

        let mut visited = vec![false; n];
        visited[start] = true;
        let mut queue = VecDeque::new();
        queue.push_back((start, 0u32));

        while let Some((current, length)) = queue.pop_front() {
            if square_type[current] == target {
                dist[start] = length;
                break;
            }
            for &next in &moves[current] {
                let ni = next.index();
                if !visited[ni] {
                    visited[ni] = true;
                    queue.push_back((ni, length + 1));
                }
            }
        }
    }

    dist
}
