//! Crate-wide error type.

use std::fmt;
use std::io;

/// Errors produced while configuring, building, or running a Knight Swap search.
#[derive(Debug)]
pub enum KnightSwapError {
    /// A configuration problem: missing/unreadable input, invalid CLI combination.
    Config(String),
    /// The instance file could not be parsed, or described an ill-formed puzzle.
    Instance(String),
    /// An inter-process communication failure (malformed frame, lost message,
    /// a worker that exited unexpectedly).
    Communication(String),
    /// An underlying I/O failure.
    Io(io::Error),
}

impl fmt::Display for KnightSwapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KnightSwapError::Config(msg) => write!(f, "configuration error: {msg}"),
            KnightSwapError::Instance(msg) => write!(f, "instance error: {msg}"),
            KnightSwapError::Communication(msg) => write!(f, "communication error: {msg}"),
            KnightSwapError::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for KnightSwapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            KnightSwapError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for KnightSwapError {
    fn from(err: io::Error) -> Self {
        KnightSwapError::Io(err)
    }
}

impl From<String> for KnightSwapError {
    fn from(msg: String) -> Self {
        KnightSwapError::Config(msg)
    }
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, KnightSwapError>;
