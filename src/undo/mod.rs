use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::mutation::{AppliedPatch, Patch};
use crate::structure::LineId;

/// What kind of user action produced an edit (batches never mix kinds)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditKind {
    Insert,
    Delete,
    /// Paste, IME composition, superscript conversion: always its own batch
    Bulk,
}

/// A reversible patch on one line
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    pub line: LineId,
    /// Patch as it was applied
    pub patch: Patch,
    /// Patch that restores the line
    pub inverse: Patch,
    pub kind: EditKind,
}

impl Edit {
    pub fn new(line: LineId, applied: &AppliedPatch, kind: EditKind) -> Self {
        Edit {
            line,
            patch: applied.patch.clone(),
            inverse: applied.inverse(),
            kind,
        }
    }

    fn is_whitespace_insert(&self) -> bool {
        self.kind == EditKind::Insert
            && matches!(self.patch.replacement.as_slice(), [c] if c.is_whitespace())
    }
}

/// Manages undo/redo history with intelligent batching
///
/// A history entry is a batch of edits undone together. Batching breaks on:
/// - Whitespace insertion
/// - Cursor movement (the next edit does not touch the previous cursor)
/// - Different operation kinds (insert vs delete)
/// - A different line
#[derive(Clone, Debug)]
pub struct UndoStack {
    commands: VecDeque<Vec<Edit>>,
    /// Current position in the stack (for redo support)
    current_index: usize,
    /// Maximum number of batches to keep in history
    max_size: usize,
    current_batch: Option<Vec<Edit>>,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(100)
    }
}

impl UndoStack {
    /// Create a new undo stack with specified maximum size
    pub fn new(max_size: usize) -> Self {
        Self {
            commands: VecDeque::new(),
            current_index: 0,
            max_size: max_size.max(1),
            current_batch: None,
        }
    }

    /// Add an edit to the history with batching
    pub fn push(&mut self, edit: Edit) {
        if self.should_break_batch(&edit) {
            self.finalize_batch();
        }

        let standalone = edit.kind == EditKind::Bulk;
        self.current_batch.get_or_insert_with(Vec::new).push(edit);
        if standalone {
            self.finalize_batch();
        }
    }

    fn should_break_batch(&self, edit: &Edit) -> bool {
        let Some(last) = self.current_batch.as_ref().and_then(|b| b.last()) else {
            return false;
        };

        if last.line != edit.line || last.kind != edit.kind || edit.kind == EditKind::Bulk {
            return true;
        }

        // Break on cursor movement
        let cursor = last.patch.new_cursor_cp;
        if cursor < edit.patch.start_cp || cursor > edit.patch.end_cp {
            return true;
        }

        edit.is_whitespace_insert()
    }

    /// Finalize the current batch and add it to the undo stack
    pub fn finalize_batch(&mut self) {
        let Some(batch) = self.current_batch.take() else {
            return;
        };
        if batch.is_empty() {
            return;
        }

        // Truncate any redo history when new command is added
        self.commands.truncate(self.current_index);
        self.commands.push_back(batch);
        self.current_index = self.commands.len();

        // Enforce max size
        if self.commands.len() > self.max_size {
            self.commands.pop_front();
            self.current_index = self.current_index.saturating_sub(1);
        }
    }

    /// Step back one batch; returns its edits in the order their inverses
    /// must be applied
    pub fn undo(&mut self) -> Result<Vec<Edit>> {
        // Finalize any pending batch first
        self.finalize_batch();

        if !self.can_undo() {
            return Err(EngineError::NothingToUndo);
        }

        self.current_index -= 1;
        Ok(self.commands[self.current_index].iter().rev().cloned().collect())
    }

    /// Step forward one batch; returns its edits in application order
    pub fn redo(&mut self) -> Result<Vec<Edit>> {
        if !self.can_redo() {
            return Err(EngineError::NothingToRedo);
        }

        let edits = self.commands[self.current_index].clone();
        self.current_index += 1;
        Ok(edits)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.current_index > 0 || self.current_batch.as_ref().is_some_and(|b| !b.is_empty())
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.current_batch.is_none() && self.current_index < self.commands.len()
    }

    /// Drop every edit that touches `line`.
    ///
    /// Called when a structural change rewrites a line outside the patch
    /// history, which would leave its recorded offsets meaningless.
    pub fn forget_line(&mut self, line: LineId) {
        self.finalize_batch();
        let mut kept = VecDeque::with_capacity(self.commands.len());
        let mut new_index = self.current_index;
        for (i, mut batch) in self.commands.drain(..).enumerate() {
            batch.retain(|e| e.line != line);
            if batch.is_empty() {
                if i < self.current_index {
                    new_index -= 1;
                }
            } else {
                kept.push_back(batch);
            }
        }
        self.commands = kept;
        self.current_index = new_index;
    }

    /// Get the number of available undo steps
    pub fn undo_count(&self) -> usize {
        self.current_index
    }
}
