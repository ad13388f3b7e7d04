//! Instance file parsing and solution/board printing.
//!
//! Grounded on the teacher's `reversi_cli::solve::solve` (file reading with
//! `BufReader`, formatted table/line printing to stdout) and on the
//! instance-file grammar and stdout contract in SPEC_FULL.md §6.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::board_state::Move;
use crate::error::{KnightSwapError, Result};
use crate::instance::{AreaCorners, Instance, InstanceBuilder};
use crate::square::Square;
use crate::types::SquareType;

/// Reads and parses an instance file at `path`.
///
/// Format: `nCols nRows k k  wc1 wr1 wc2 wr2  bc1 br1 bc2 br2`, all on one
/// whitespace-separated line (or split across several; only the tokens
/// matter). `k` appears twice and both occurrences must agree.
pub fn read_instance_file(path: &Path) -> Result<Instance> {
    let file = File::open(path).map_err(KnightSwapError::Io)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader
        .read_to_string(&mut contents)
        .map_err(KnightSwapError::Io)?;
    parse_instance(&contents)
}

/// Parses the instance grammar from an in-memory string, as read by
/// [`read_instance_file`].
pub fn parse_instance(contents: &str) -> Result<Instance> {
    let mut tokens = contents.split_whitespace();
    let mut next_i64 = |name: &str| -> Result<i64> {
        tokens
            .next()
            .ok_or_else(|| KnightSwapError::Config(format!("missing field: {name}")))?
            .parse::<i64>()
            .map_err(|e| KnightSwapError::Config(format!("invalid {name}: {e}")))
    };

    let n_cols = next_i64("nCols")?;
    let n_rows = next_i64("nRows")?;
    let k1 = next_i64("k (first)")?;
    let k2 = next_i64("k (second)")?;
    if k1 != k2 {
        return Err(KnightSwapError::Config(format!(
            "k appears twice and must agree: {k1} != {k2}"
        )));
    }

    let wc1 = next_i64("wc1")?;
    let wr1 = next_i64("wr1")?;
    let wc2 = next_i64("wc2")?;
    let wr2 = next_i64("wr2")?;

    let bc1 = next_i64("bc1")?;
    let br1 = next_i64("br1")?;
    let bc2 = next_i64("bc2")?;
    let br2 = next_i64("br2")?;

    if n_cols <= 0 || n_rows <= 0 {
        return Err(KnightSwapError::Config(
            "nCols and nRows must be positive".to_string(),
        ));
    }
    if k1 <= 0 {
        return Err(KnightSwapError::Config("k must be positive".to_string()));
    }

    let white_area = AreaCorners {
        col1: wc1,
        row1: wr1,
        col2: wc2,
        row2: wr2,
    };
    let black_area = AreaCorners {
        col1: bc1,
        row1: br1,
        col2: bc2,
        row2: br2,
    };

    InstanceBuilder::new(n_cols as u32, n_rows as u32, k1 as u32, white_area, black_area).build()
}

/// Prints the solution the way SPEC_FULL.md §6 specifies: a length/iteration
/// header followed by one board snapshot per move, or a "does not exist"
/// message if the solution is empty.
pub fn print_solution(instance: &Instance, moves: &[Move], iterations: u64) {
    if moves.is_empty() {
        println!("Solution either does not exist or it is trivial (zero moves)!");
        return;
    }

    println!("Solution length: {}", moves.len());
    println!("Found after {iterations} iterations");

    let mut cells = initial_cells(instance);
    print_board(&cells, instance.n_cols, instance.n_rows);

    for mv in moves {
        let moved = cells[mv.from.index()];
        cells[mv.from.index()] = '.';
        cells[mv.to.index()] = moved;
        println!();
        print_board(&cells, instance.n_cols, instance.n_rows);
    }
}

fn initial_cells(instance: &Instance) -> Vec<char> {
    let mut cells = vec!['.'; instance.n_squares as usize];
    for p in 0..instance.n_squares {
        let sq = Square::new(p as u16);
        cells[p as usize] = match instance.square_type(sq) {
            SquareType::White => 'W',
            SquareType::Black => 'B',
            SquareType::Basic => '.',
        };
    }
    cells
}

fn print_board(cells: &[char], n_cols: u32, n_rows: u32) {
    for row in 0..n_rows {
        let start = (row * n_cols) as usize;
        let end = start + n_cols as usize;
        let line: String = cells[start..end].iter().collect();
        println!("{line}");
    }
}
