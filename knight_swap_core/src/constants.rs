//! Global constants.

/// Size of a CPU cache line in bytes.
pub const CACHE_LINE_SIZE: usize = 64;

/// Maximum number of threads supported by a single worker's task pool.
pub const MAX_THREADS: usize = 64;

/// Default splitting factor used by the root splitter: the root queue is
/// grown until it holds at least `threads_per_worker * ROOT_SPLIT_FACTOR`
/// entries.
pub const ROOT_SPLIT_FACTOR: usize = 3;

/// Default number of times the coordinator will double the heuristic
/// upper-bound ceiling and retry a fruitless search (see the `U0` fallback
/// policy).
pub const DEFAULT_U0_RETRY_ROUNDS: u32 = 4;

/// Upper bound on knights per side, sized from the board-size ceiling
/// implied by the original tool's hard-coded message buffers
/// (`nSquares <= 400`, so `k <= nSquares / 2 <= 200`). Knight position
/// lists use a fixed-capacity inline vector of this size to avoid a heap
/// allocation per search node; instances with a larger `k` are rejected at
/// build time rather than silently truncated.
pub const MAX_K: usize = 200;
