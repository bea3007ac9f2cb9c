//! Parsing module for the notation editing engine
//!
//! Classification of single codepoints, the combining productions used while
//! editing, and beat derivation over a classified line.

pub mod beats;
pub mod classify;
pub mod codepoint_parser;

// Re-export commonly used types
pub use beats::*;
pub use classify::{classify, CharClasses};
