//! UTF-16 ↔ codepoint position mapping
//!
//! Host text controls report offsets in UTF-16 code units; the engine
//! indexes by codepoint. Superscript glyphs and barlines sit outside the BMP
//! and occupy two code units, so the two coordinate systems drift apart.
//!
//! The mapper keeps a prefix table `offsets[i]` = UTF-16 offset of codepoint
//! `i`, with one trailing entry for the end of the line. It is owned by the
//! line buffer and refreshed from the first changed index on every mutation.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionMapper {
    offsets: Vec<usize>,
}

impl PositionMapper {
    pub fn new(chars: &[char]) -> Self {
        let mut mapper = PositionMapper { offsets: vec![0] };
        mapper.refresh_from(chars, 0);
        mapper
    }

    /// Recompute entries from codepoint index `start` onward.
    ///
    /// Everything before `start` is unaffected by an edit beginning there.
    pub(crate) fn refresh_from(&mut self, chars: &[char], start: usize) {
        let start = start.min(chars.len()).min(self.offsets.len() - 1);
        self.offsets.truncate(start + 1);
        let mut offset = self.offsets[start];
        self.offsets.reserve(chars.len() - start);
        for ch in &chars[start..] {
            offset += ch.len_utf16();
            self.offsets.push(offset);
        }
    }

    /// Number of codepoints covered
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length of the line in UTF-16 code units
    pub fn external_len(&self) -> usize {
        self.offsets[self.len()]
    }

    /// UTF-16 offset of a codepoint boundary (clamped to the line end)
    pub fn to_external_offset(&self, cp_index: usize) -> usize {
        self.offsets[cp_index.min(self.len())]
    }

    /// Codepoint index for a UTF-16 offset.
    ///
    /// Offsets past the end clamp to the line end; an offset inside a
    /// surrogate pair snaps back to the start of that codepoint.
    pub fn to_codepoint_index(&self, offset: usize) -> usize {
        if offset >= self.external_len() {
            return self.len();
        }
        // first boundary strictly greater than offset, minus one
        self.offsets.partition_point(|&o| o <= offset) - 1
    }

    /// Whether `offset` falls on a codepoint boundary
    pub fn is_boundary(&self, offset: usize) -> bool {
        self.offsets.binary_search(&offset).is_ok()
    }
}

impl Default for PositionMapper {
    fn default() -> Self {
        PositionMapper::new(&[])
    }
}
