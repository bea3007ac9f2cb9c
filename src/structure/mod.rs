//! Document structure
//!
//! Lines live in an arena keyed by stable ids; row numbers are derived from
//! the arena's explicit order and change only through structural operations
//! (split, join, insert, remove, reorder).

pub mod arena;

// Re-exports for convenience
pub use arena::{LineArena, LineId};
