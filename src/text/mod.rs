//! Layer 0: Text Editor Core
//!
//! Pure codepoint storage with no knowledge of musical notation. All musical
//! semantics are derived from this representation.
//!
//! ## Modules
//!
//! - `buffer`: per-line codepoint storage, patch application
//! - `position`: UTF-16 offset ↔ codepoint index mapping

pub mod buffer;
pub mod position;

// Re-exports for convenience
pub use buffer::LineBuffer;
pub use position::PositionMapper;
