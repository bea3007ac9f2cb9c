//! Text buffer implementation (Layer 0)
//!
//! Pure codepoint storage for one document line, with no musical knowledge.
//! The position mapper lives inside the buffer and is refreshed by
//! `apply_patch`, the only way content changes.

use super::position::PositionMapper;
use crate::mutation::patch::{AppliedPatch, ExternalPatch, Patch};

#[derive(Debug, Clone, Default)]
pub struct LineBuffer {
    chars: Vec<char>,
    mapper: PositionMapper,
    dirty: bool,
}

impl LineBuffer {
    /// Create a new empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer from a string
    pub fn from_str(s: &str) -> Self {
        Self::from_chars(s.chars().collect())
    }

    pub fn from_chars(chars: Vec<char>) -> Self {
        let mapper = PositionMapper::new(&chars);
        LineBuffer {
            chars,
            mapper,
            dirty: true,
        }
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn get(&self, index: usize) -> Option<char> {
        self.chars.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn mapper(&self) -> &PositionMapper {
        &self.mapper
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn to_external_offset(&self, cp_index: usize) -> usize {
        self.mapper.to_external_offset(cp_index)
    }

    pub fn to_codepoint_index(&self, offset: usize) -> usize {
        self.mapper.to_codepoint_index(offset)
    }

    /// Order and clamp a selection to `[0, len]`.
    ///
    /// Host offsets can transiently disagree with the buffer during rapid
    /// edits, so out-of-range input is repaired rather than rejected.
    pub fn clamp_selection(&self, start: usize, end: usize) -> (usize, usize) {
        let len = self.chars.len();
        let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
        let clamped = (lo.min(len), hi.min(len));
        if clamped != (start, end) {
            log::debug!(
                "selection {}..{} clamped to {}..{} (len {})",
                start, end, clamped.0, clamped.1, len
            );
        }
        clamped
    }

    /// Apply a patch, returning it with its UTF-16 translation and the
    /// removed codepoints. Out-of-range patches are clamped.
    pub fn apply_patch(&mut self, patch: &Patch) -> AppliedPatch {
        let (start, end) = self.clamp_selection(patch.start_cp, patch.end_cp);
        let ext_start = self.mapper.to_external_offset(start);
        let ext_end = self.mapper.to_external_offset(end);

        let removed: Vec<char> = self
            .chars
            .splice(start..end, patch.replacement.iter().copied())
            .collect();
        self.mapper.refresh_from(&self.chars, start);
        if start != end || !patch.replacement.is_empty() {
            self.dirty = true;
        }

        let cursor = patch.new_cursor_cp.min(self.chars.len());
        let applied = Patch {
            start_cp: start,
            end_cp: end,
            replacement: patch.replacement.clone(),
            new_cursor_cp: cursor,
        };
        AppliedPatch {
            external: ExternalPatch {
                start: ext_start,
                end: ext_end,
                text: patch.replacement.iter().collect(),
                cursor: self.mapper.to_external_offset(cursor),
            },
            patch: applied,
            removed,
        }
    }

    /// Remove and return everything from `at` to the end of the line
    pub(crate) fn split_off(&mut self, at: usize) -> Vec<char> {
        let at = at.min(self.chars.len());
        let tail = self.chars.split_off(at);
        self.mapper.refresh_from(&self.chars, at);
        self.dirty = true;
        tail
    }

    /// Append codepoints to the end of the line
    pub(crate) fn append(&mut self, tail: &[char]) {
        let at = self.chars.len();
        self.chars.extend_from_slice(tail);
        self.mapper.refresh_from(&self.chars, at);
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_insert() {
        let mut buf = LineBuffer::from_str("13");
        let applied = buf.apply_patch(&Patch::insert(1, vec!['2']));
        assert_eq!(buf.text(), "123");
        assert_eq!(applied.patch.new_cursor_cp, 2);
        assert!(applied.removed.is_empty());
        assert!(buf.is_dirty());
    }

    #[test]
    fn test_apply_replace_returns_removed() {
        let mut buf = LineBuffer::from_str("1#2");
        let applied = buf.apply_patch(&Patch::replace(0, 2, vec!['\u{E019}']));
        assert_eq!(buf.chars(), &['\u{E019}', '2']);
        assert_eq!(applied.removed, vec!['1', '#']);
        assert_eq!(applied.inverse(), Patch::replace(0, 1, vec!['1', '#']));
    }

    #[test]
    fn test_external_patch_uses_utf16_offsets() {
        let mut buf = LineBuffer::from_str("\u{1D100}1");
        let applied = buf.apply_patch(&Patch::insert(2, vec!['\u{F8000}']));
        assert_eq!(applied.external.start, 3);
        assert_eq!(applied.external.end, 3);
        assert_eq!(applied.external.cursor, 5);
        assert_eq!(buf.mapper().external_len(), 5);
    }

    #[test]
    fn test_out_of_bounds_patch_is_clamped() {
        let mut buf = LineBuffer::from_str("12");
        let applied = buf.apply_patch(&Patch::replace(5, 9, vec!['3']));
        assert_eq!(buf.text(), "123");
        assert_eq!(applied.patch.start_cp, 2);
        assert_eq!(applied.patch.new_cursor_cp, 3);
    }

    #[test]
    fn test_clamp_selection_orders_and_clamps() {
        let buf = LineBuffer::from_str("123");
        assert_eq!(buf.clamp_selection(2, 1), (1, 2));
        assert_eq!(buf.clamp_selection(1, 99), (1, 3));
    }

    #[test]
    fn test_split_and_append() {
        let mut buf = LineBuffer::from_str("12\u{1D100}3");
        let tail = buf.split_off(2);
        assert_eq!(buf.text(), "12");
        assert_eq!(buf.mapper().external_len(), 2);
        buf.append(&tail);
        assert_eq!(buf.text(), "12\u{1D100}3");
        assert_eq!(buf.mapper().external_len(), 5);
    }

    #[test]
    fn test_noop_patch_keeps_line_clean() {
        let mut buf = LineBuffer::from_str("12");
        buf.mark_clean();
        buf.apply_patch(&Patch::noop(1));
        assert!(!buf.is_dirty());
    }
}
