//! Error types for the editing engine
//!
//! Mutation-path conditions (`MutationRejected`, `AmbiguousAttachment`) are
//! recovered inside the engine and only logged; the remaining variants are
//! returned to callers of structural and history operations.

use crate::structure::LineId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The grammar-aware mutator could not interpret the input combination
    #[error("Mutation rejected: {reason}")]
    MutationRejected { reason: String },

    /// A superscript group with no previous pitch and no adjacent following pitch
    #[error("Superscript group at {start}..{end} has nothing to attach to")]
    AmbiguousAttachment { start: usize, end: usize },

    #[error("Unknown line: {0}")]
    UnknownLine(LineId),

    #[error("Line {0} has no previous line to join with")]
    NoPreviousLine(LineId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid line order: {0}")]
    InvalidReorder(String),

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,
}

impl EngineError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        EngineError::MutationRejected { reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
