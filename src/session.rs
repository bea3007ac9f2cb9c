//! Edit session
//!
//! Owns the lines of one document together with everything that reacts to
//! their mutation: the input interceptor, the reparse scheduler, the undo
//! history and the outbound event queue. Every content change goes through
//! `commit`, so dirty tracking, history and notifications cannot drift apart.

use serde::Serialize;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::events::{EngineEvent, EventQueue};
use crate::input::{InputEvent, InputInterceptor, Interception};
use crate::models::serde_helpers::serialize_option_as_null;
use crate::models::{ElementKind, PitchSystem};
use crate::mutation::{AppliedPatch, MutationPath, Patch};
use crate::parse::{BeatDeriver, BeatSpan, CharClasses, Diagnostic, LineAnalysis, SuperscriptGroup, UnderlineState};
use crate::schedule::{FlushTimer, ReparseScheduler};
use crate::structure::{LineArena, LineId};
use crate::text::LineBuffer;
use crate::undo::{Edit, EditKind, UndoStack};

/// One document line: its codepoints and its last grammar result
#[derive(Debug, Clone, Default)]
pub struct Line {
    pub buffer: LineBuffer,
    analysis: Option<LineAnalysis>,
}

impl Line {
    fn new(buffer: LineBuffer) -> Self {
        Line { buffer, analysis: None }
    }

    /// Grammar result of the last flush, if the line has been flushed since
    /// its last mutation
    pub fn analysis(&self) -> Option<&LineAnalysis> {
        if self.buffer.is_dirty() {
            None
        } else {
            self.analysis.as_ref()
        }
    }
}

/// Result of handling one input event
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct InputOutcome {
    pub line: LineId,
    /// None when the event was deferred (IME composition in progress)
    #[serde(serialize_with = "serialize_option_as_null")]
    pub applied: Option<AppliedPatch>,
    #[serde(serialize_with = "serialize_option_as_null")]
    pub path: Option<MutationPath>,
    /// Lines whose grammar was flushed while handling the event
    pub flushed: Vec<LineId>,
}

/// Result of joining a line into its predecessor
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct JoinResult {
    pub line: LineId,
    /// Codepoint where the joined content begins
    pub cursor_cp: usize,
}

/// Render-ready data for one line
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct LineRenderData {
    pub line: LineId,
    pub row: usize,
    pub text: String,
    #[serde(serialize_with = "serialize_option_as_null")]
    pub cursor: Option<usize>,
    #[serde(serialize_with = "serialize_option_as_null")]
    pub selection: Option<(usize, usize)>,
    pub kinds: Vec<ElementKind>,
    pub beats: Vec<BeatSpan>,
    pub underlines: Vec<UnderlineState>,
    pub grace_groups: Vec<SuperscriptGroup>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct EditSession {
    config: EngineConfig,
    pitch_system: PitchSystem,
    lines: LineArena<Line>,
    interceptor: InputInterceptor,
    scheduler: ReparseScheduler,
    deriver: BeatDeriver,
    undo: UndoStack,
    events: EventQueue,
}

impl EditSession {
    pub fn new(config: EngineConfig, timer: Box<dyn FlushTimer>) -> Result<Self> {
        config.validate()?;
        let pitch_system = config.default_pitch_system;
        Ok(EditSession {
            pitch_system,
            lines: LineArena::new(),
            interceptor: InputInterceptor::new(CharClasses::for_system(pitch_system)),
            scheduler: ReparseScheduler::new(config.fast_path_threshold, config.debounce_ms, timer),
            deriver: BeatDeriver::new(config.beat_config()),
            undo: UndoStack::new(config.undo_limit),
            events: EventQueue::new(config.event_queue_capacity),
            config,
        })
    }

    /// Create a session holding the given lines, already flushed
    pub fn with_lines<S: AsRef<str>>(config: EngineConfig, timer: Box<dyn FlushTimer>, lines: &[S]) -> Result<Self> {
        let mut session = EditSession::new(config, timer)?;
        for text in lines {
            session.insert_line(session.lines.len(), text.as_ref());
        }
        session.flush_all();
        session.events.drain();
        Ok(session)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn pitch_system(&self) -> PitchSystem {
        self.pitch_system
    }

    pub fn classes(&self) -> &'static CharClasses {
        self.interceptor.engine().classes()
    }

    pub fn line_ids(&self) -> &[LineId] {
        self.lines.order()
    }

    pub fn line(&self, id: LineId) -> Result<&Line> {
        self.lines.get(id)
    }

    pub fn line_text(&self, id: LineId) -> Result<String> {
        Ok(self.lines.get(id)?.buffer.text())
    }

    pub fn scheduler(&self) -> &ReparseScheduler {
        &self.scheduler
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    pub fn handle_input(&mut self, id: LineId, event: &InputEvent) -> Result<InputOutcome> {
        let line = self.lines.get(id)?;
        let (mutation, kind) = match self.interceptor.intercept(&line.buffer, event) {
            Interception::Mutate { mutation, kind } => (mutation, kind),
            Interception::Deferred => {
                return Ok(InputOutcome { line: id, applied: None, path: None, flushed: Vec::new() });
            }
        };

        let applied = self.commit(id, &mutation.patch, kind, mutation.path)?;
        let flushed = if self.scheduler.needs_immediate_flush() {
            self.flush_all()
        } else {
            Vec::new()
        };

        Ok(InputOutcome {
            line: id,
            applied: Some(applied),
            path: Some(mutation.path),
            flushed,
        })
    }

    /// Apply a patch to a line and record it everywhere that tracks content
    fn commit(&mut self, id: LineId, patch: &Patch, kind: EditKind, path: MutationPath) -> Result<AppliedPatch> {
        let line = self.lines.get_mut(id)?;
        let applied = line.buffer.apply_patch(patch);
        if applied.patch.is_noop() {
            return Ok(applied);
        }

        self.undo.push(Edit::new(id, &applied, kind));
        self.scheduler.note_mutation(id, path);
        self.events.push(EngineEvent::LineChanged { line: id });
        Ok(applied)
    }

    /// Convert pitches and dashes in a codepoint range to grace notes
    pub fn to_superscript(&mut self, id: LineId, start_cp: usize, end_cp: usize) -> Result<AppliedPatch> {
        let line = self.lines.get(id)?;
        let mutation = self.interceptor.engine().to_superscript(&line.buffer, start_cp, end_cp);
        let applied = self.commit(id, &mutation.patch, EditKind::Bulk, mutation.path)?;
        self.scheduler.request_immediate(id);
        self.flush_all();
        Ok(applied)
    }

    // ------------------------------------------------------------------
    // Grammar flush
    // ------------------------------------------------------------------

    /// Run the grammar over every dirty line, returning them in row order
    pub fn flush_all(&mut self) -> Vec<LineId> {
        let mut dirty = self.scheduler.begin_flush();
        dirty.retain(|id| self.lines.contains(*id));
        dirty.sort_by_key(|id| self.lines.row_of(*id).unwrap_or(usize::MAX));

        for id in &dirty {
            self.analyze_line(*id);
            self.events.push(EngineEvent::RenderNeeded { line: *id });
        }
        if !dirty.is_empty() {
            log::debug!("flushed {} line(s)", dirty.len());
        }
        dirty
    }

    /// The debounce timer delivered its shot
    pub fn on_timer_fired(&mut self) -> Vec<LineId> {
        self.scheduler.timer_fired();
        self.flush_all()
    }

    fn analyze_line(&mut self, id: LineId) {
        let system = self.pitch_system;
        let Ok(line) = self.lines.get_mut(id) else {
            return;
        };
        let kinds = line.buffer.chars().iter().map(|c| crate::parse::classify(*c, system)).collect();
        line.analysis = Some(self.deriver.analyze(kinds));
        line.buffer.mark_clean();
    }

    /// Grammar result for a line, flushing it first if it is dirty
    pub fn analysis(&mut self, id: LineId) -> Result<&LineAnalysis> {
        if self.lines.get(id)?.buffer.is_dirty() {
            self.scheduler.request_immediate(id);
            self.flush_all();
        }
        let line = self.lines.get(id)?;
        line.analysis.as_ref().ok_or(EngineError::UnknownLine(id))
    }

    pub fn line_render_data(
        &mut self,
        id: LineId,
        cursor: Option<usize>,
        selection: Option<(usize, usize)>,
    ) -> Result<LineRenderData> {
        let row = self.lines.row_of(id)?;
        let analysis = self.analysis(id)?.clone();
        let buffer = &self.lines.get(id)?.buffer;
        let len = buffer.len();

        Ok(LineRenderData {
            line: id,
            row,
            text: buffer.text(),
            cursor: cursor.map(|c| c.min(len)),
            selection: selection.map(|(s, e)| buffer.clamp_selection(s, e)),
            kinds: analysis.kinds,
            beats: analysis.beats,
            underlines: analysis.underlines,
            grace_groups: analysis.groups,
            diagnostics: analysis.diagnostics,
        })
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    fn renumbered(&mut self) {
        self.events.push(EngineEvent::LinesRenumbered { order: self.lines.order().to_vec() });
    }

    fn mark_new_line(&mut self, id: LineId) {
        self.scheduler.note_mutation(id, MutationPath::Grammar);
        self.events.push(EngineEvent::LineChanged { line: id });
    }

    /// Insert a line at `row` (clamped to the end)
    pub fn insert_line(&mut self, row: usize, text: &str) -> LineId {
        let id = self.lines.insert(row, Line::new(LineBuffer::from_str(text)));
        self.mark_new_line(id);
        self.renumbered();
        id
    }

    pub fn remove_line(&mut self, id: LineId) -> Result<()> {
        self.lines.remove(id)?;
        self.scheduler.forget(id);
        self.undo.forget_line(id);
        self.renumbered();
        Ok(())
    }

    /// Move everything from `at_cp` onward into a new line after `id`
    pub fn split_line(&mut self, id: LineId, at_cp: usize) -> Result<LineId> {
        let row = self.lines.row_of(id)?;
        let tail = self.lines.get_mut(id)?.buffer.split_off(at_cp);
        let new_id = self.lines.insert(row + 1, Line::new(LineBuffer::from_chars(tail)));

        self.undo.forget_line(id);
        self.mark_new_line(id);
        self.mark_new_line(new_id);
        self.renumbered();
        Ok(new_id)
    }

    /// Append a line to its predecessor and remove it
    pub fn join_with_previous(&mut self, id: LineId) -> Result<JoinResult> {
        let row = self.lines.row_of(id)?;
        let prev = row
            .checked_sub(1)
            .and_then(|r| self.lines.id_at(r))
            .ok_or(EngineError::NoPreviousLine(id))?;

        let removed = self.lines.remove(id)?;
        let target = self.lines.get_mut(prev)?;
        let cursor_cp = target.buffer.len();
        target.buffer.append(removed.buffer.chars());

        self.scheduler.forget(id);
        self.undo.forget_line(id);
        self.undo.forget_line(prev);
        self.mark_new_line(prev);
        self.renumbered();
        Ok(JoinResult { line: prev, cursor_cp })
    }

    pub fn reorder(&mut self, order: Vec<LineId>) -> Result<()> {
        self.lines.reorder(order)?;
        self.renumbered();
        Ok(())
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    pub fn undo(&mut self) -> Result<Vec<(LineId, AppliedPatch)>> {
        let edits = self.undo.undo()?;
        self.replay(edits.into_iter().map(|e| (e.line, e.inverse)))
    }

    pub fn redo(&mut self) -> Result<Vec<(LineId, AppliedPatch)>> {
        let edits = self.undo.redo()?;
        self.replay(edits.into_iter().map(|e| (e.line, e.patch)))
    }

    /// Apply history patches without recording them again
    fn replay(&mut self, patches: impl Iterator<Item = (LineId, Patch)>) -> Result<Vec<(LineId, AppliedPatch)>> {
        let mut applied = Vec::new();
        for (id, patch) in patches {
            let line = self.lines.get_mut(id)?;
            applied.push((id, line.buffer.apply_patch(&patch)));
            self.scheduler.note_mutation(id, MutationPath::Grammar);
            self.events.push(EngineEvent::LineChanged { line: id });
        }
        Ok(applied)
    }

    // ------------------------------------------------------------------
    // Configuration and lifecycle
    // ------------------------------------------------------------------

    /// Switch pitch system: reload classification sets and reparse every line
    pub fn set_pitch_system(&mut self, system: PitchSystem) -> Vec<LineId> {
        if system == self.pitch_system {
            return Vec::new();
        }
        log::info!("pitch system {} -> {}", self.pitch_system.name(), system.name());
        self.pitch_system = system;
        self.interceptor.set_classes(CharClasses::for_system(system));

        let ids: Vec<LineId> = self.lines.order().to_vec();
        for id in ids {
            if let Ok(line) = self.lines.get_mut(id) {
                line.buffer.mark_dirty();
            }
            self.scheduler.request_immediate(id);
        }
        self.flush_all()
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.events.drain()
    }

    /// Cancel the pending timer; the session keeps its content
    pub fn dispose(&mut self) {
        self.scheduler.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::Attachment;
    use crate::schedule::NoopTimer;

    fn session(lines: &[&str]) -> EditSession {
        EditSession::with_lines(EngineConfig::default(), Box::new(NoopTimer), lines).unwrap()
    }

    fn type_text(s: &mut EditSession, id: LineId, text: &str) {
        for ch in text.chars() {
            let end = s.line(id).unwrap().buffer.mapper().external_len();
            let event = InputEvent::Insert { text: ch.to_string(), sel_start: end, sel_end: end };
            s.handle_input(id, &event).unwrap();
        }
    }

    #[test]
    fn test_typing_marks_dirty_and_queues_event() {
        let mut s = session(&[""]);
        let id = s.line_ids()[0];
        type_text(&mut s, id, "1");
        assert!(s.line(id).unwrap().buffer.is_dirty());
        assert!(s.line(id).unwrap().analysis().is_none());
        assert_eq!(s.drain_events(), vec![EngineEvent::LineChanged { line: id }]);
    }

    #[test]
    fn test_third_local_splice_flushes() {
        let mut s = session(&[""]);
        let id = s.line_ids()[0];
        type_text(&mut s, id, "12");
        let event = InputEvent::Insert { text: "3".into(), sel_start: 2, sel_end: 2 };
        let outcome = s.handle_input(id, &event).unwrap();
        assert_eq!(outcome.flushed, vec![id]);
        let analysis = s.line(id).unwrap().analysis().unwrap();
        assert_eq!(analysis.beats.len(), 1);
    }

    #[test]
    fn test_flush_is_idempotent() {
        let mut s = session(&["1⁵2 3"]);
        let id = s.line_ids()[0];
        let first = s.analysis(id).unwrap().clone();
        assert!(s.flush_all().is_empty());
        let second = s.analysis(id).unwrap().clone();
        assert_eq!(first, second);
    }

    #[test]
    fn test_render_data_flushes_dirty_line() {
        let mut s = session(&["1"]);
        let id = s.line_ids()[0];
        type_text(&mut s, id, "⁵2");
        let data = s.line_render_data(id, Some(99), None).unwrap();
        assert_eq!(data.text, "1⁵2");
        assert_eq!(data.cursor, Some(3));
        assert_eq!(data.grace_groups[0].attachment, Attachment::Before(2));
        assert_eq!(data.underlines[0], UnderlineState::Left);
    }

    #[test]
    fn test_split_and_join() {
        let mut s = session(&["12 34"]);
        let a = s.line_ids()[0];
        let b = s.split_line(a, 3).unwrap();
        assert_eq!(s.line_text(a).unwrap(), "12 ");
        assert_eq!(s.line_text(b).unwrap(), "34");
        assert_eq!(s.line_ids(), &[a, b]);
        assert!(s
            .drain_events()
            .contains(&EngineEvent::LinesRenumbered { order: vec![a, b] }));

        let joined = s.join_with_previous(b).unwrap();
        assert_eq!(joined, JoinResult { line: a, cursor_cp: 3 });
        assert_eq!(s.line_text(a).unwrap(), "12 34");
        assert_eq!(s.line(b).err(), Some(EngineError::UnknownLine(b)));
    }

    #[test]
    fn test_join_first_line_fails() {
        let mut s = session(&["1"]);
        let a = s.line_ids()[0];
        assert_eq!(s.join_with_previous(a), Err(EngineError::NoPreviousLine(a)));
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut s = session(&[""]);
        let id = s.line_ids()[0];
        type_text(&mut s, id, "1#");
        assert_eq!(s.line_text(id).unwrap(), "\u{E019}");
        s.undo().unwrap();
        assert_eq!(s.line_text(id).unwrap(), "");
        s.redo().unwrap();
        assert_eq!(s.line_text(id).unwrap(), "\u{E019}");
        assert!(s.line(id).unwrap().buffer.is_dirty());
    }

    #[test]
    fn test_pitch_system_switch_reclassifies() {
        let mut s = session(&["SR"]);
        let id = s.line_ids()[0];
        assert!(s.analysis(id).unwrap().beats.is_empty());
        let flushed = s.set_pitch_system(PitchSystem::Sargam);
        assert_eq!(flushed, vec![id]);
        assert_eq!(s.analysis(id).unwrap().beats.len(), 1);
        assert!(s.classes().simple_chars().contains(&'S'));
    }

    #[test]
    fn test_to_superscript_flushes() {
        let mut s = session(&["1 2"]);
        let id = s.line_ids()[0];
        s.to_superscript(id, 2, 3).unwrap();
        let analysis = s.line(id).unwrap().analysis().unwrap();
        assert_eq!(analysis.kinds[2], ElementKind::SuperscriptPitched);
        assert_eq!(analysis.groups[0].attachment, Attachment::After(0));
    }

    #[test]
    fn test_unknown_line() {
        let mut s = session(&["1"]);
        let stale = LineId { index: 7, generation: 0 };
        let event = InputEvent::DeleteBackward { sel_start: 0, sel_end: 0 };
        assert_eq!(s.handle_input(stale, &event).err(), Some(EngineError::UnknownLine(stale)));
    }
}
