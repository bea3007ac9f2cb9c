//! Mutation engine
//!
//! Turns an insertion or deletion against a line buffer into a `Patch`.
//! The engine never applies patches itself; callers apply the returned patch
//! to the buffer, which keeps position mapping and dirtiness in one place.
//!
//! Two paths:
//! - local splice: one simple codepoint typed at a collapsed cursor
//! - grammar-aware: combining marks, selections, multi-codepoint input and all
//!   deletions. A rejected grammar mutation falls back to a literal splice so
//!   no keystroke is ever dropped.

pub mod patch;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::models::glyphs;
use crate::parse::classify::{is_never_alone, CharClasses};
use crate::parse::codepoint_parser::{normalize, peel, try_combine};
use crate::text::LineBuffer;

pub use patch::{AppliedPatch, ExternalPatch, Patch};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeleteDirection {
    Backward,
    Forward,
}

/// Which path produced a patch
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MutationPath {
    LocalSplice,
    Grammar,
    /// Grammar rejected the input; the literal input was spliced
    Fallback,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mutation {
    pub patch: Patch,
    pub path: MutationPath,
}

impl Mutation {
    fn new(patch: Patch, path: MutationPath) -> Self {
        Mutation { patch, path }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MutationEngine {
    classes: &'static CharClasses,
}

impl MutationEngine {
    pub fn new(classes: &'static CharClasses) -> Self {
        MutationEngine { classes }
    }

    pub fn classes(&self) -> &'static CharClasses {
        self.classes
    }

    /// Swap in the classification sets of another pitch system
    pub fn set_classes(&mut self, classes: &'static CharClasses) {
        self.classes = classes;
    }

    /// Insert codepoints over the selection `[sel_start, sel_end)`
    pub fn insert(&self, buffer: &LineBuffer, sel_start: usize, sel_end: usize, input: &[char]) -> Mutation {
        let (start, end) = buffer.clamp_selection(sel_start, sel_end);

        if input.is_empty() {
            return if start == end {
                Mutation::new(Patch::noop(start), MutationPath::Grammar)
            } else {
                self.delete_range(buffer, start, end, DeleteDirection::Backward)
            };
        }

        if let [ch] = input {
            if start == end && self.classes.is_simple(*ch) {
                return Mutation::new(Patch::insert(start, vec![*ch]), MutationPath::LocalSplice);
            }
        }

        self.insert_with_fallback(buffer, start, end, input)
    }

    /// Insert through the grammar-aware mutator only, skipping the local
    /// splice shortcut
    pub fn insert_via_grammar(
        &self,
        buffer: &LineBuffer,
        sel_start: usize,
        sel_end: usize,
        input: &[char],
    ) -> Mutation {
        let (start, end) = buffer.clamp_selection(sel_start, sel_end);
        self.insert_with_fallback(buffer, start, end, input)
    }

    fn insert_with_fallback(&self, buffer: &LineBuffer, start: usize, end: usize, input: &[char]) -> Mutation {
        match self.grammar_insert(buffer, start, end, input) {
            Ok(patch) => Mutation::new(patch, MutationPath::Grammar),
            Err(err) => {
                log::info!("{}; splicing input literally", err);
                Mutation::new(Patch::replace(start, end, input.to_vec()), MutationPath::Fallback)
            }
        }
    }

    /// Combine each input codepoint into its left neighbour where a
    /// production applies, normalizing the rest
    fn grammar_insert(&self, buffer: &LineBuffer, start: usize, end: usize, input: &[char]) -> Result<Patch> {
        let system = self.classes.system();
        let mut start = start;
        let mut out: Vec<char> = Vec::with_capacity(input.len());

        for &raw in input {
            let combined = match out.last() {
                Some(&prev) => try_combine(prev, raw, system).map(|c| (c, false)),
                None if start > 0 => buffer
                    .get(start - 1)
                    .and_then(|prev| try_combine(prev, raw, system))
                    .map(|c| (c, true)),
                None => None,
            };

            match combined {
                Some((c, true)) => {
                    // merged into the codepoint left of the selection
                    start -= 1;
                    out.push(c);
                }
                Some((c, false)) => {
                    if let Some(last) = out.last_mut() {
                        *last = c;
                    }
                }
                None if is_never_alone(raw) => {
                    return Err(EngineError::rejected(format!(
                        "U+{:04X} has no element to modify at {}",
                        raw as u32,
                        start + out.len()
                    )));
                }
                None => out.push(normalize(raw)),
            }
        }

        Ok(Patch::replace(start, end, out))
    }

    /// Delete the selection, or one codepoint next to a collapsed cursor
    pub fn delete_range(
        &self,
        buffer: &LineBuffer,
        sel_start: usize,
        sel_end: usize,
        direction: DeleteDirection,
    ) -> Mutation {
        let (start, end) = buffer.clamp_selection(sel_start, sel_end);
        let len = buffer.len();

        let (start, end) = if start == end {
            match direction {
                DeleteDirection::Backward => {
                    if start == 0 {
                        return Mutation::new(Patch::noop(0), MutationPath::Grammar);
                    }
                    // single-key codepoints are removed whole; only composites peel
                    let peeled = buffer
                        .get(start - 1)
                        .filter(|c| !self.classes.is_allowlisted(*c))
                        .and_then(|c| peel(c, self.classes.system()));
                    if let Some(peeled) = peeled {
                        let patch = Patch::replace(start - 1, start, vec![peeled]);
                        return Mutation::new(patch, MutationPath::Grammar);
                    }
                    (start - 1, start)
                }
                DeleteDirection::Forward => {
                    if start >= len {
                        return Mutation::new(Patch::noop(start), MutationPath::Grammar);
                    }
                    (start, start + 1)
                }
            }
        } else {
            (start, end)
        };

        Mutation::new(self.rejoin(buffer, start, end), MutationPath::Grammar)
    }

    /// Delete `[start, end)`, merging stray marks that end up next to a host
    fn rejoin(&self, buffer: &LineBuffer, start: usize, end: usize) -> Patch {
        let system = self.classes.system();
        let Some(mut host) = start.checked_sub(1).and_then(|i| buffer.get(i)) else {
            return Patch::delete(start, end);
        };

        let mut merged_end = end;
        while let Some(mark) = buffer.get(merged_end).filter(|c| is_never_alone(*c)) {
            match try_combine(host, mark, system) {
                Some(c) => {
                    host = c;
                    merged_end += 1;
                }
                None => break,
            }
        }

        if merged_end == end {
            Patch::delete(start, end)
        } else {
            log::debug!("merged {} stray mark(s) into U+{:04X}", merged_end - end, host as u32);
            Patch::replace(start - 1, merged_end, vec![host])
        }
    }

    /// Convert pitches and dashes in `[sel_start, sel_end)` to their
    /// superscript (grace note) forms
    pub fn to_superscript(&self, buffer: &LineBuffer, sel_start: usize, sel_end: usize) -> Mutation {
        let (start, end) = buffer.clamp_selection(sel_start, sel_end);
        let system = self.classes.system();
        let replacement: Vec<char> = buffer.chars()[start..end]
            .iter()
            .map(|&c| glyphs::to_superscript(c, system).unwrap_or(c))
            .collect();
        Mutation::new(Patch::replace(start, end, replacement), MutationPath::Grammar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::glyphs::{BARLINE_DOUBLE, BARLINE_REPEAT_LEFT, BARLINE_SINGLE};
    use crate::models::PitchSystem;
    use crate::parse::classify::OCTAVE_UP;

    fn engine() -> MutationEngine {
        MutationEngine::new(CharClasses::for_system(PitchSystem::Number))
    }

    fn apply(buffer: &mut LineBuffer, m: &Mutation) {
        buffer.apply_patch(&m.patch);
    }

    #[test]
    fn test_simple_insert_is_local_splice() {
        let buf = LineBuffer::from_str("12");
        let m = engine().insert(&buf, 1, 1, &['5']);
        assert_eq!(m.path, MutationPath::LocalSplice);
        assert_eq!(m.patch, Patch { start_cp: 1, end_cp: 1, replacement: vec!['5'], new_cursor_cp: 2 });
    }

    #[test]
    fn test_sharp_merges_into_previous_pitch() {
        let mut buf = LineBuffer::from_str("1");
        let m = engine().insert(&buf, 1, 1, &['#']);
        assert_eq!(m.path, MutationPath::Grammar);
        assert_eq!(m.patch, Patch::replace(0, 1, vec!['\u{E019}']));
        apply(&mut buf, &m);
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn test_pipe_is_normalized() {
        let m = engine().insert(&LineBuffer::new(), 0, 0, &['|']);
        assert_eq!(m.patch.replacement, vec![BARLINE_SINGLE]);
    }

    #[test]
    fn test_barline_sequences() {
        let eng = engine();
        let mut buf = LineBuffer::new();
        for ch in ['|', '|'] {
            let m = eng.insert(&buf, buf.len(), buf.len(), &[ch]);
            apply(&mut buf, &m);
        }
        assert_eq!(buf.chars(), &[BARLINE_DOUBLE]);

        let mut buf = LineBuffer::new();
        let m = eng.insert(&buf, 0, 0, &['|', ':']);
        apply(&mut buf, &m);
        assert_eq!(buf.chars(), &[BARLINE_REPEAT_LEFT]);
    }

    #[test]
    fn test_stray_mark_falls_back_to_literal() {
        let buf = LineBuffer::from_str(" ");
        let m = engine().insert(&buf, 1, 1, &['#']);
        assert_eq!(m.path, MutationPath::Fallback);
        assert_eq!(m.patch, Patch::insert(1, vec!['#']));
    }

    #[test]
    fn test_fallback_keeps_whole_input() {
        let buf = LineBuffer::new();
        let m = engine().insert(&buf, 0, 0, &['1', '#', '/', '#']);
        assert_eq!(m.path, MutationPath::Fallback);
        assert_eq!(m.patch.replacement, vec!['1', '#', '/', '#']);
    }

    #[test]
    fn test_replace_selection() {
        let mut buf = LineBuffer::from_str("1234");
        let m = engine().insert(&buf, 1, 3, &['5']);
        assert_eq!(m.path, MutationPath::Grammar);
        apply(&mut buf, &m);
        assert_eq!(buf.text(), "154");
        assert_eq!(m.patch.new_cursor_cp, 2);
    }

    #[test]
    fn test_backspace_peels_composite() {
        let eng = engine();
        let mut buf = LineBuffer::from_str("1");
        let mt = eng.insert(&buf, 1, 1, &['#']);
        apply(&mut buf, &mt);
        let mt = eng.insert(&buf, 1, 1, &[OCTAVE_UP]);
        apply(&mut buf, &mt);

        let m = eng.delete_range(&buf, 1, 1, DeleteDirection::Backward);
        apply(&mut buf, &m);
        assert_eq!(buf.chars(), &['\u{E019}']);
        assert_eq!(m.patch.new_cursor_cp, 1);

        let mt = eng.delete_range(&buf, 1, 1, DeleteDirection::Backward);
        apply(&mut buf, &mt);
        assert_eq!(buf.text(), "1");
        let mt = eng.delete_range(&buf, 1, 1, DeleteDirection::Backward);
        apply(&mut buf, &mt);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_backspace_removes_sargam_letters_whole() {
        let eng = MutationEngine::new(CharClasses::for_system(PitchSystem::Sargam));
        for text in ["M", "r", "S", "N"] {
            let mut buf = LineBuffer::from_str(text);
            let m = eng.delete_range(&buf, 1, 1, DeleteDirection::Backward);
            assert_eq!(m.patch, Patch::delete(0, 1), "{}", text);
            apply(&mut buf, &m);
            assert!(buf.is_empty(), "{}", text);
        }
    }

    #[test]
    fn test_backspace_after_sargam_sharp_clears_letter() {
        let eng = MutationEngine::new(CharClasses::for_system(PitchSystem::Sargam));
        let mut buf = LineBuffer::from_str("Sr");
        let mt = eng.insert(&buf, 2, 2, &['#']);
        apply(&mut buf, &mt);
        assert_eq!(buf.text(), "SR");

        let mt = eng.delete_range(&buf, 2, 2, DeleteDirection::Backward);
        apply(&mut buf, &mt);
        assert_eq!(buf.text(), "S");
    }

    #[test]
    fn test_backspace_still_peels_sargam_composite() {
        let eng = MutationEngine::new(CharClasses::for_system(PitchSystem::Sargam));
        let mut buf = LineBuffer::from_str("P");
        let mt = eng.insert(&buf, 1, 1, &[OCTAVE_UP]);
        apply(&mut buf, &mt);
        assert_ne!(buf.text(), "P");

        let mt = eng.delete_range(&buf, 1, 1, DeleteDirection::Backward);
        apply(&mut buf, &mt);
        assert_eq!(buf.text(), "P");
    }

    #[test]
    fn test_delete_at_edges_is_noop() {
        let buf = LineBuffer::from_str("12");
        let back = engine().delete_range(&buf, 0, 0, DeleteDirection::Backward);
        assert!(back.patch.is_noop());
        assert_eq!(back.patch.new_cursor_cp, 0);
        let fwd = engine().delete_range(&buf, 2, 2, DeleteDirection::Forward);
        assert!(fwd.patch.is_noop());
        assert_eq!(fwd.patch.new_cursor_cp, 2);
    }

    #[test]
    fn test_forward_delete() {
        let mut buf = LineBuffer::from_str("123");
        let m = engine().delete_range(&buf, 1, 1, DeleteDirection::Forward);
        apply(&mut buf, &m);
        assert_eq!(buf.text(), "13");
        assert_eq!(m.patch.new_cursor_cp, 1);
    }

    #[test]
    fn test_deletion_merges_stray_mark() {
        // "1 #" with the space deleted leaves '#' next to '1'
        let mut buf = LineBuffer::from_str("1 #");
        let m = engine().delete_range(&buf, 2, 2, DeleteDirection::Backward);
        assert_eq!(m.patch, Patch::replace(0, 3, vec!['\u{E019}']));
        apply(&mut buf, &m);
        assert_eq!(buf.chars(), &['\u{E019}']);
        assert_eq!(m.patch.new_cursor_cp, 1);
    }

    #[test]
    fn test_out_of_range_selection_clamped() {
        let buf = LineBuffer::from_str("12");
        let m = engine().insert(&buf, 7, 9, &['3']);
        assert_eq!(m.patch.start_cp, 2);
        assert_eq!(m.patch.end_cp, 2);
    }

    #[test]
    fn test_to_superscript_range() {
        let buf = LineBuffer::from_str("1-2 3");
        let m = engine().to_superscript(&buf, 0, 4);
        assert_eq!(m.patch.start_cp, 0);
        assert_eq!(m.patch.end_cp, 4);
        assert!(m.patch.replacement[..3].iter().all(|c| glyphs::is_superscript(*c)));
        assert_eq!(m.patch.replacement[3], ' ');
    }

    #[test]
    fn test_fast_path_matches_grammar_path() {
        let buf = LineBuffer::from_str("1 2");
        let eng = engine();
        for ch in ['1', '-', ' ', 'x', '\''] {
            let fast = eng.insert(&buf, 2, 2, &[ch]);
            let slow = eng.insert_via_grammar(&buf, 2, 2, &[ch]);
            let mut a = buf.clone();
            let mut b = buf.clone();
            a.apply_patch(&fast.patch);
            b.apply_patch(&slow.patch);
            assert_eq!(a.chars(), b.chars(), "{:?}", ch);
        }
    }
}
