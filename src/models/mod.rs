//! Models module for the notation editing engine
//!
//! Element classification, pitch codes, and the codepoint encoding of
//! notation glyphs.

pub mod elements;
pub mod glyphs;
pub mod pitch_code;
pub mod serde_helpers;

// Re-export commonly used types
pub use elements::*;
pub use pitch_code::{AccidentalType, PitchCode};
