//! Notation Editor Core WASM Module
//!
//! Codepoint-level editing engine for line-structured music notation:
//! intercepts host input, applies it as codepoint patches (a local splice or
//! a grammar-aware merge of combining marks), and derives beats, underline
//! spans and grace-note attachment per line.

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod input;
pub mod models;
pub mod mutation;
pub mod parse;
pub mod schedule;
pub mod session;
pub mod structure;
pub mod text;
pub mod undo;

// Re-export commonly used types
pub use config::{BeatConfig, EngineConfig};
pub use error::EngineError;
pub use events::EngineEvent;
pub use input::InputEvent;
pub use models::{ElementKind, PitchSystem};
pub use mutation::{AppliedPatch, MutationEngine, MutationPath, Patch};
pub use session::{EditSession, InputOutcome, JoinResult, LineRenderData};
pub use structure::LineId;
pub use text::{LineBuffer, PositionMapper};

use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    #[cfg(feature = "console_log")]
    {
        if console_log::init_with_level(log::Level::Debug).is_err() {
            wasm_warn!("logger already initialized");
        }
    }

    log::info!("Notation editor core WASM module initialized");
}
