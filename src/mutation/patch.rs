//! Patch: the single description of a line mutation
//!
//! - start_cp/end_cp: half-open codepoint range being replaced
//! - replacement: codepoints that take its place
//! - new_cursor_cp: absolute cursor after the patch is applied
//!
//! Hosts that mirror buffer content apply the `ExternalPatch` translation,
//! which carries the same edit in UTF-16 code units.

use serde::{Deserialize, Serialize};

use crate::models::serde_helpers::codepoints;

/// A patch representing a text mutation
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Patch {
    /// Start of range to replace (codepoint index, inclusive)
    pub start_cp: usize,
    /// End of range to replace (codepoint index, exclusive)
    pub end_cp: usize,
    /// Replacement codepoints
    #[serde(with = "codepoints")]
    pub replacement: Vec<char>,
    /// New cursor position after applying patch
    pub new_cursor_cp: usize,
}

impl Patch {
    /// Create a simple insert patch (no deletion)
    pub fn insert(at: usize, codepoints: Vec<char>) -> Self {
        let len = codepoints.len();
        Patch {
            start_cp: at,
            end_cp: at,
            replacement: codepoints,
            new_cursor_cp: at + len,
        }
    }

    /// Create a delete patch (no insertion)
    pub fn delete(start: usize, end: usize) -> Self {
        Patch {
            start_cp: start,
            end_cp: end,
            replacement: vec![],
            new_cursor_cp: start,
        }
    }

    /// Create a replace patch
    pub fn replace(start: usize, end: usize, codepoints: Vec<char>) -> Self {
        let len = codepoints.len();
        Patch {
            start_cp: start,
            end_cp: end,
            replacement: codepoints,
            new_cursor_cp: start + len,
        }
    }

    /// A patch that changes nothing and places the cursor
    pub fn noop(cursor: usize) -> Self {
        Patch {
            start_cp: cursor,
            end_cp: cursor,
            replacement: vec![],
            new_cursor_cp: cursor,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.start_cp == self.end_cp && self.replacement.is_empty()
    }

    /// Compute the inverse patch (for undo)
    /// Requires the original codepoints that were replaced
    pub fn inverse(&self, replaced_cps: Vec<char>) -> Self {
        let new_cursor = self.start_cp + replaced_cps.len();
        Patch {
            start_cp: self.start_cp,
            end_cp: self.start_cp + self.replacement.len(),
            replacement: replaced_cps,
            new_cursor_cp: new_cursor,
        }
    }
}

/// The same edit expressed in UTF-16 code units for the host text control
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ExternalPatch {
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub cursor: usize,
}

/// A patch after it has been applied to a buffer
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct AppliedPatch {
    pub patch: Patch,
    pub external: ExternalPatch,
    /// Codepoints that the patch removed
    #[serde(with = "codepoints")]
    pub removed: Vec<char>,
}

impl AppliedPatch {
    pub fn inverse(&self) -> Patch {
        self.patch.inverse(self.removed.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_place_cursor() {
        assert_eq!(Patch::insert(2, vec!['1', '2']).new_cursor_cp, 4);
        assert_eq!(Patch::delete(1, 3).new_cursor_cp, 1);
        assert_eq!(Patch::replace(1, 3, vec!['x']).new_cursor_cp, 2);
        assert!(Patch::noop(5).is_noop());
    }

    #[test]
    fn test_inverse() {
        let patch = Patch::replace(1, 3, vec!['\u{E019}']);
        let inv = patch.inverse(vec!['1', '#']);
        assert_eq!(inv.start_cp, 1);
        assert_eq!(inv.end_cp, 2);
        assert_eq!(inv.replacement, vec!['1', '#']);
        assert_eq!(inv.new_cursor_cp, 3);
    }

    #[test]
    fn test_serializes_codepoints_as_numbers() {
        let json = serde_json::to_value(Patch::insert(0, vec!['1'])).unwrap();
        assert_eq!(json["replacement"], serde_json::json!([49]));
    }
}
