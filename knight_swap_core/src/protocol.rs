//! Wire protocol between the coordinator and worker processes.
//!
//! Every message is a flat sequence of little-endian `i32`s behind a single
//! `u8` tag byte (SPEC_FULL.md §6). Grounded on the teacher's network
//! evaluation loaders (`eval/output_layer.rs`, `eval/base_input.rs`), which
//! read/write fixed binary layouts through `byteorder::{LittleEndian,
//! ReadBytesExt, WriteBytesExt}`.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::board_state::{BoardState, Move};
use crate::instance::Instance;
use crate::square::Square;
use crate::types::SquareType;

/// Distinct message kinds. Values are arbitrary but must agree between the
/// coordinator and every worker (SPEC_FULL.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Tag {
    InstanceBlob = 0,
    AssignRoot = 1,
    AssignMeta = 2,
    UpperBoundUpdate = 3,
    SolutionReport = 4,
    Terminate = 5,
}

impl Tag {
    fn from_byte(b: u8) -> io::Result<Tag> {
        Ok(match b {
            0 => Tag::InstanceBlob,
            1 => Tag::AssignRoot,
            2 => Tag::AssignMeta,
            3 => Tag::UpperBoundUpdate,
            4 => Tag::SolutionReport,
            5 => Tag::Terminate,
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("unknown message tag {other}"),
                ));
            }
        });
    }
}

fn write_tag<W: Write>(w: &mut W, tag: Tag) -> io::Result<()> {
    w.write_u8(tag as u8)
}

/// Reads the leading tag byte of a message, used by a dispatch loop to
/// decide which payload reader to call next.
pub fn read_tag<R: Read>(r: &mut R) -> io::Result<Tag> {
    let b = r.read_u8()?;
    Tag::from_byte(b)
}

/// Serializes an [`Instance`] as `nSquares, k,
/// {p, |moves[p]|, moves[p]...} x nSquares, {squareType[p]} x nSquares,
/// {p, distToBlack[p]} x nSquares, {p, distToWhite[p]} x nSquares`.
pub fn write_instance<W: Write>(w: &mut W, instance: &Instance) -> io::Result<()> {
    write_tag(w, Tag::InstanceBlob)?;
    w.write_i32::<LittleEndian>(instance.n_squares as i32)?;
    w.write_i32::<LittleEndian>(instance.k as i32)?;

    for p in 0..instance.n_squares {
        let square = Square::new(p as u16);
        let moves = instance.moves_from(square);
        w.write_i32::<LittleEndian>(p as i32)?;
        w.write_i32::<LittleEndian>(moves.len() as i32)?;
        for &dest in moves {
            w.write_i32::<LittleEndian>(u16::from(dest) as i32)?;
        }
    }

    for p in 0..instance.n_squares {
        let square = Square::new(p as u16);
        let tag = match instance.square_type(square) {
            SquareType::Basic => 0,
            SquareType::White => 1,
            SquareType::Black => 2,
        };
        w.write_i32::<LittleEndian>(tag)?;
    }

    for p in 0..instance.n_squares {
        let square = Square::new(p as u16);
        w.write_i32::<LittleEndian>(p as i32)?;
        w.write_i32::<LittleEndian>(instance.dist_to_destination(SquareType::White, square) as i32)?;
    }

    for p in 0..instance.n_squares {
        let square = Square::new(p as u16);
        w.write_i32::<LittleEndian>(p as i32)?;
        w.write_i32::<LittleEndian>(instance.dist_to_destination(SquareType::Black, square) as i32)?;
    }

    Ok(())
}

/// Reads back the squares-and-moves, square types, and distance tables
/// written by [`write_instance`]. Returns the raw components rather than a
/// constructed [`Instance`]: reassembly belongs to whichever caller (a
/// worker process) needs it, since `Instance`'s fields are private to its
/// module and only `InstanceBuilder` constructs one from scratch today.
pub struct InstanceBlob {
    pub n_squares: usize,
    pub k: usize,
    pub moves: Vec<Vec<Square>>,
    pub square_type: Vec<SquareType>,
    pub dist_to_white: Vec<u32>,
    pub dist_to_black: Vec<u32>,
}

pub fn read_instance_blob<R: Read>(r: &mut R) -> io::Result<InstanceBlob> {
    let n_squares = r.read_i32::<LittleEndian>()? as usize;
    let k = r.read_i32::<LittleEndian>()? as usize;

    let mut moves = vec![Vec::new(); n_squares];
    for _ in 0..n_squares {
        let p = r.read_i32::<LittleEndian>()? as usize;
        let count = r.read_i32::<LittleEndian>()? as usize;
        let mut dests = Vec::with_capacity(count);
        for _ in 0..count {
            dests.push(Square::new(r.read_i32::<LittleEndian>()? as u16));
        }
        moves[p] = dests;
    }

    let mut square_type = Vec::with_capacity(n_squares);
    for _ in 0..n_squares {
        let tag = r.read_i32::<LittleEndian>()?;
        square_type.push(match tag {
            0 => SquareType::Basic,
            1 => SquareType::White,
            2 => SquareType::Black,
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("unknown square type {other}"),
                ));
            }
        });
    }

    let mut dist_to_white = vec![0u32; n_squares];
    for _ in 0..n_squares {
        let p = r.read_i32::<LittleEndian>()? as usize;
        dist_to_white[p] = r.read_i32::<LittleEndian>()? as u32;
    }

    let mut dist_to_black = vec![0u32; n_squares];
    for _ in 0..n_squares {
        let p = r.read_i32::<LittleEndian>()? as usize;
        dist_to_black[p] = r.read_i32::<LittleEndian>()? as u32;
    }

    Ok(InstanceBlob {
        n_squares,
        k,
        moves,
        square_type,
        dist_to_white,
        dist_to_black,
    })
}

/// Serializes a [`BoardState`] as `whitesLeft, blacksLeft, |whites|,
/// whites..., |blacks|, blacks..., |occupied|, occupied..., lowerBound,
/// |movesTaken|, (from,to)...`.
pub fn write_board_state<W: Write>(w: &mut W, tag: Tag, state: &BoardState) -> io::Result<()> {
    write_tag(w, tag)?;
    w.write_i32::<LittleEndian>(state.whites_left as i32)?;
    w.write_i32::<LittleEndian>(state.blacks_left as i32)?;

    w.write_i32::<LittleEndian>(state.whites.len() as i32)?;
    for &sq in &state.whites {
        w.write_i32::<LittleEndian>(u16::from(sq) as i32)?;
    }

    w.write_i32::<LittleEndian>(state.blacks.len() as i32)?;
    for &sq in &state.blacks {
        w.write_i32::<LittleEndian>(u16::from(sq) as i32)?;
    }

    w.write_i32::<LittleEndian>(state.occupied.len() as i32)?;
    for i in 0..state.occupied.len() {
        w.write_i32::<LittleEndian>(if state.occupied.test(i) { 1 } else { 0 })?;
    }

    w.write_i32::<LittleEndian>(state.lower_bound as i32)?;
    w.write_i32::<LittleEndian>(state.moves.len() as i32)?;
    for mv in &state.moves {
        w.write_i32::<LittleEndian>(u16::from(mv.from) as i32)?;
        w.write_i32::<LittleEndian>(u16::from(mv.to) as i32)?;
    }

    Ok(())
}

/// The fields of a [`BoardState`] as read off the wire. Reconstructing the
/// `occupied` bitset and `ArrayVec` knight lists is left to the caller,
/// which already owns the `Instance` needed to size them.
pub struct BoardStateBlob {
    pub whites_left: u32,
    pub blacks_left: u32,
    pub whites: Vec<Square>,
    pub blacks: Vec<Square>,
    pub occupied: Vec<bool>,
    pub lower_bound: u32,
    pub moves: Vec<Move>,
}

pub fn read_board_state_blob<R: Read>(r: &mut R) -> io::Result<BoardStateBlob> {
    let whites_left = r.read_i32::<LittleEndian>()? as u32;
    let blacks_left = r.read_i32::<LittleEndian>()? as u32;

    let n_whites = r.read_i32::<LittleEndian>()? as usize;
    let mut whites = Vec::with_capacity(n_whites);
    for _ in 0..n_whites {
        whites.push(Square::new(r.read_i32::<LittleEndian>()? as u16));
    }

    let n_blacks = r.read_i32::<LittleEndian>()? as usize;
    let mut blacks = Vec::with_capacity(n_blacks);
    for _ in 0..n_blacks {
        blacks.push(Square::new(r.read_i32::<LittleEndian>()? as u16));
    }

    let n_occupied = r.read_i32::<LittleEndian>()? as usize;
    let mut occupied = Vec::with_capacity(n_occupied);
    for _ in 0..n_occupied {
        occupied.push(r.read_i32::<LittleEndian>()? != 0);
    }

    let lower_bound = r.read_i32::<LittleEndian>()? as u32;
    let n_moves = r.read_i32::<LittleEndian>()? as usize;
    let mut moves = Vec::with_capacity(n_moves);
    for _ in 0..n_moves {
        let from = Square::new(r.read_i32::<LittleEndian>()? as u16);
        let to = Square::new(r.read_i32::<LittleEndian>()? as u16);
        moves.push(Move { from, to });
    }

    Ok(BoardStateBlob {
        whites_left,
        blacks_left,
        whites,
        blacks,
        occupied,
        lower_bound,
        moves,
    })
}

/// `initLowerBound, upperBound, step`.
pub struct AssignMeta {
    pub init_lower_bound: u32,
    pub upper_bound: u32,
    pub step: u32,
}

pub fn write_assign_meta<W: Write>(w: &mut W, meta: &AssignMeta) -> io::Result<()> {
    write_tag(w, Tag::AssignMeta)?;
    w.write_i32::<LittleEndian>(meta.init_lower_bound as i32)?;
    w.write_i32::<LittleEndian>(meta.upper_bound as i32)?;
    w.write_i32::<LittleEndian>(meta.step as i32)
}

pub fn read_assign_meta<R: Read>(r: &mut R) -> io::Result<AssignMeta> {
    Ok(AssignMeta {
        init_lower_bound: r.read_i32::<LittleEndian>()? as u32,
        upper_bound: r.read_i32::<LittleEndian>()? as u32,
        step: r.read_i32::<LittleEndian>()? as u32,
    })
}

/// `newUpperBound`.
pub fn write_upper_bound_update<W: Write>(w: &mut W, new_upper: u32) -> io::Result<()> {
    write_tag(w, Tag::UpperBoundUpdate)?;
    w.write_i32::<LittleEndian>(new_upper as i32)
}

pub fn read_upper_bound_update<R: Read>(r: &mut R) -> io::Result<u32> {
    Ok(r.read_i32::<LittleEndian>()? as u32)
}

/// `length, (from,to)×length, iterationCount`.
pub struct SolutionReport {
    pub moves: Vec<Move>,
    pub iteration_count: u64,
}

pub fn write_solution_report<W: Write>(w: &mut W, report: &SolutionReport) -> io::Result<()> {
    write_tag(w, Tag::SolutionReport)?;
    w.write_i32::<LittleEndian>(report.moves.len() as i32)?;
    for mv in &report.moves {
        w.write_i32::<LittleEndian>(u16::from(mv.from) as i32)?;
        w.write_i32::<LittleEndian>(u16::from(mv.to) as i32)?;
    }
    w.write_i64::<LittleEndian>(report.iteration_count as i64)
}

pub fn read_solution_report<R: Read>(r: &mut R) -> io::Result<SolutionReport> {
    let length = r.read_i32::<LittleEndian>()? as usize;
    let mut moves = Vec::with_capacity(length);
    for _ in 0..length {
        let from = Square::new(r.read_i32::<LittleEndian>()? as u16);
        let to = Square::new(r.read_i32::<LittleEndian>()? as u16);
        moves.push(Move { from, to });
    }
    let iteration_count = r.read_i64::<LittleEndian>()? as u64;
    Ok(SolutionReport {
        moves,
        iteration_count,
    })
}

/// No payload beyond the tag.
pub fn write_terminate<W: Write>(w: &mut W) -> io::Result<()> {
    write_tag(w, Tag::Terminate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{AreaCorners, InstanceBuilder};
    use std::io::Cursor;

    fn area(col1: i64, row1: i64, col2: i64, row2: i64) -> AreaCorners {
        AreaCorners {
            col1,
            row1,
            col2,
            row2,
        }
    }

    #[test]
    fn test_instance_round_trips() {
        let inst = InstanceBuilder::new(4, 4, 1, area(0, 0, 0, 0), area(3, 3, 3, 3))
            .build()
            .unwrap();

        let mut buf = Vec::new();
        write_instance(&mut buf, &inst).unwrap();

        let mut cursor = Cursor::new(buf);
        assert_eq!(read_tag(&mut cursor).unwrap(), Tag::InstanceBlob);
        let blob = read_instance_blob(&mut cursor).unwrap();

        assert_eq!(blob.n_squares, inst.n_squares as usize);
        assert_eq!(blob.k, inst.k as usize);
        for p in 0..blob.n_squares {
            let sq = Square::new(p as u16);
            assert_eq!(blob.square_type[p], inst.square_type(sq));
            assert_eq!(
                blob.dist_to_white[p],
                inst.dist_to_destination(SquareType::White, sq)
            );
            assert_eq!(
                blob.dist_to_black[p],
                inst.dist_to_destination(SquareType::Black, sq)
            );
            assert_eq!(blob.moves[p], inst.moves_from(sq).to_vec());
        }
    }

    #[test]
    fn test_board_state_round_trips() {
        let inst = InstanceBuilder::new(4, 4, 1, area(0, 0, 0, 0), area(3, 3, 3, 3))
            .build()
            .unwrap();
        let state = BoardState::initial(&inst);

        let mut buf = Vec::new();
        write_board_state(&mut buf, Tag::AssignRoot, &state).unwrap();

        let mut cursor = Cursor::new(buf);
        assert_eq!(read_tag(&mut cursor).unwrap(), Tag::AssignRoot);
        let blob = read_board_state_blob(&mut cursor).unwrap();

        assert_eq!(blob.whites_left, state.whites_left);
        assert_eq!(blob.blacks_left, state.blacks_left);
        assert_eq!(blob.whites, state.whites.to_vec());
        assert_eq!(blob.blacks, state.blacks.to_vec());
        assert_eq!(blob.lower_bound, state.lower_bound);
        assert_eq!(blob.moves.len(), state.moves.len());
        assert_eq!(blob.occupied.len(), state.occupied.len());
    }

    #[test]
    fn test_assign_meta_round_trips() {
        let mut buf = Vec::new();
        write_assign_meta(
            &mut buf,
            &AssignMeta {
                init_lower_bound: 3,
                upper_bound: 10,
                step: 0,
            },
        )
        .unwrap();
        let mut cursor = Cursor::new(buf);
        assert_eq!(read_tag(&mut cursor).unwrap(), Tag::AssignMeta);
        let meta = read_assign_meta(&mut cursor).unwrap();
        assert_eq!(meta.init_lower_bound, 3);
        assert_eq!(meta.upper_bound, 10);
        assert_eq!(meta.step, 0);
    }

    #[test]
    fn test_upper_bound_update_round_trips() {
        let mut buf = Vec::new();
        write_upper_bound_update(&mut buf, 7).unwrap();
        let mut cursor = Cursor::new(buf);
        assert_eq!(read_tag(&mut cursor).unwrap(), Tag::UpperBoundUpdate);
        assert_eq!(read_upper_bound_update(&mut cursor).unwrap(), 7);
    }

    #[test]
    fn test_solution_report_round_trips() {
        let mut buf = Vec::new();
        write_solution_report(
            &mut buf,
            &SolutionReport {
                moves: vec![Move {
                    from: Square::new(0),
                    to: Square::new(5),
                }],
                iteration_count: 42,
            },
        )
        .unwrap();
        let mut cursor = Cursor::new(buf);
        assert_eq!(read_tag(&mut cursor).unwrap(), Tag::SolutionReport);
        let report = read_solution_report(&mut cursor).unwrap();
        assert_eq!(report.moves.len(), 1);
        assert_eq!(report.iteration_count, 42);
    }

    #[test]
    fn test_terminate_has_no_payload() {
        let mut buf = Vec::new();
        write_terminate(&mut buf).unwrap();
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let mut cursor = Cursor::new(vec![99u8]);
        assert!(read_tag(&mut cursor).is_err());
    }
}
