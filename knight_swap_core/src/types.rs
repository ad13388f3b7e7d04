//! Common type aliases and small value types used throughout the engine.

/// Classification of a square on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SquareType {
    Basic,
    White,
    Black,
}

impl SquareType {
    /// The region a knight of this color must reach to be "home".
    ///
    /// Only meaningful for `White`/`Black`; `Basic` has no destination.
    #[inline]
    pub fn destination(self) -> SquareType {
        match self {
            SquareType::White => SquareType::Black,
            SquareType::Black => SquareType::White,
            SquareType::Basic => SquareType::Basic,
        }
    }
}

/// Step index within a search (0 = initial state, 1 = after the first move).
pub type Step = u32;

/// Length of a move sequence.
pub type MoveCount = u32;

/// A knight-hop distance, or an upper bound / lower bound value.
pub type Dist = u32;

/// Sentinel meaning "unreachable" for a distance table entry.
pub const DIST_UNREACHABLE: Dist = u32::MAX;
