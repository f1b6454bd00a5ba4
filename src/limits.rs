//! Configuration bounds.
//!
//! The overlay re-scans the trailing block on every chunk, so the token
//! series table is kept small and its patterns cheap.

/// Maximum number of token series in one table.
pub const MAX_SERIES: usize = 64;

/// Maximum number of matchers in one token series.
pub const MAX_MATCHERS_PER_SERIES: usize = 32;

/// Compiled size limit for a single matcher pattern, in bytes.
pub const MAX_PATTERN_SIZE: usize = 1 << 20;

/// Longest pending buffer the overlay can address. Range offsets are `u32`.
pub const MAX_PENDING_LEN: usize = u32::MAX as usize;

/// Context stack entries kept inline before spilling to the heap.
pub const INLINE_STACK_DEPTH: usize = 4;

/// Ranges per context entry kept inline before spilling to the heap.
pub const INLINE_RANGES_PER_ENTRY: usize = 8;
