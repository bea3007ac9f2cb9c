//! Notation Editor WASM API
//!
//! JavaScript-facing surface over one global edit session.
//!
//! # Module Structure
//!
//! - `helpers`: logging macros, serialization, session lock
//! - `session`: the exported engine operations
//! - `timer`: `setTimeout`-backed debounce timer

pub mod helpers;
pub mod session;
pub mod timer;

pub use session::*;
pub use timer::BrowserTimer;
