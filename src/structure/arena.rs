//! Line arena with stable identities
//!
//! Lines are stored in slots addressed by a generational `LineId`. The id of
//! a line never changes while it exists; a removed line's slot is reused with
//! a bumped generation so stale ids are detected instead of aliasing a new
//! line. Row order is a separate vector, changed only by explicit structural
//! operations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Stable identity of a document line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineId {
    pub index: u32,
    pub generation: u32,
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

#[derive(Debug, Clone)]
pub struct LineArena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    order: Vec<LineId>,
}

impl<T> Default for LineArena<T> {
    fn default() -> Self {
        LineArena {
            slots: Vec::new(),
            free: Vec::new(),
            order: Vec::new(),
        }
    }
}

impl<T> LineArena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of lines
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Line ids in row order
    pub fn order(&self) -> &[LineId] {
        &self.order
    }

    pub fn contains(&self, id: LineId) -> bool {
        self.slot(id).is_some()
    }

    fn slot(&self, id: LineId) -> Option<&Slot<T>> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation && s.value.is_some())
    }

    pub fn get(&self, id: LineId) -> Result<&T> {
        self.slot(id)
            .and_then(|s| s.value.as_ref())
            .ok_or(EngineError::UnknownLine(id))
    }

    pub fn get_mut(&mut self, id: LineId) -> Result<&mut T> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.value.as_mut())
            .ok_or(EngineError::UnknownLine(id))
    }

    /// Insert a line at `row` (clamped to the end), returning its new id
    pub fn insert(&mut self, row: usize, value: T) -> LineId {
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.generation += 1;
                slot.value = Some(value);
                LineId { index, generation: slot.generation }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot { generation: 0, value: Some(value) });
                LineId { index, generation: 0 }
            }
        };
        let row = row.min(self.order.len());
        self.order.insert(row, id);
        id
    }

    /// Append a line after the last row
    pub fn push(&mut self, value: T) -> LineId {
        self.insert(self.order.len(), value)
    }

    pub fn remove(&mut self, id: LineId) -> Result<T> {
        let row = self.row_of(id)?;
        let value = self.slots[id.index as usize]
            .value
            .take()
            .ok_or(EngineError::UnknownLine(id))?;
        self.order.remove(row);
        self.free.push(id.index);
        Ok(value)
    }

    pub fn row_of(&self, id: LineId) -> Result<usize> {
        if !self.contains(id) {
            return Err(EngineError::UnknownLine(id));
        }
        self.order
            .iter()
            .position(|&l| l == id)
            .ok_or(EngineError::UnknownLine(id))
    }

    pub fn id_at(&self, row: usize) -> Option<LineId> {
        self.order.get(row).copied()
    }

    /// Replace the row order; `order` must be a permutation of the current lines
    pub fn reorder(&mut self, order: Vec<LineId>) -> Result<()> {
        if order.len() != self.order.len() {
            return Err(EngineError::InvalidReorder(format!(
                "expected {} lines, got {}",
                self.order.len(),
                order.len()
            )));
        }
        let mut sorted = order.clone();
        sorted.sort();
        sorted.dedup();
        if sorted.len() != order.len() {
            return Err(EngineError::InvalidReorder("duplicate line id".to_string()));
        }
        if let Some(unknown) = order.iter().find(|id| !self.contains(**id)) {
            return Err(EngineError::InvalidReorder(format!("unknown line {}", unknown)));
        }
        self.order = order;
        Ok(())
    }
}
