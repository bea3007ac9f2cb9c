//! Input interception
//!
//! Raw host input events carry UTF-16 offsets. The interceptor converts them
//! to codepoint indices through the line's position mapper and turns each
//! event into a `Mutation`.
//!
//! During IME composition the host control owns the text: inserts are
//! deferred, and on composition end the final value is diffed against the
//! line and the inserted span re-normalized through the grammar.

use serde::{Deserialize, Serialize};

use crate::mutation::{DeleteDirection, Mutation, MutationEngine};
use crate::parse::CharClasses;
use crate::text::LineBuffer;
use crate::undo::EditKind;

/// A raw input event from the host text control (UTF-16 offsets)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    Insert {
        text: String,
        sel_start: usize,
        sel_end: usize,
    },
    DeleteBackward {
        sel_start: usize,
        sel_end: usize,
    },
    DeleteForward {
        sel_start: usize,
        sel_end: usize,
    },
    Paste {
        text: String,
        sel_start: usize,
        sel_end: usize,
    },
    CompositionStart {
        sel_start: usize,
        sel_end: usize,
        /// Control value when composition began
        #[serde(default)]
        value: Option<String>,
    },
    CompositionEnd {
        /// Control value after the IME committed
        value: String,
    },
}

/// What the interceptor decided for one event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Interception {
    Mutate { mutation: Mutation, kind: EditKind },
    /// The host owns the text until composition ends
    Deferred,
}

#[derive(Debug, Clone)]
pub struct InputInterceptor {
    engine: MutationEngine,
    composing: bool,
}

impl InputInterceptor {
    pub fn new(classes: &'static CharClasses) -> Self {
        InputInterceptor {
            engine: MutationEngine::new(classes),
            composing: false,
        }
    }

    pub fn engine(&self) -> &MutationEngine {
        &self.engine
    }

    pub fn set_classes(&mut self, classes: &'static CharClasses) {
        self.engine.set_classes(classes);
    }

    pub fn is_composing(&self) -> bool {
        self.composing
    }

    pub fn intercept(&mut self, buffer: &LineBuffer, event: &InputEvent) -> Interception {
        let to_cp = |offset: usize| buffer.to_codepoint_index(offset);

        match event {
            InputEvent::CompositionStart { value, .. } => {
                if let Some(value) = value {
                    if *value != buffer.text() {
                        log::debug!("composition snapshot differs from line content; using line content");
                    }
                }
                self.composing = true;
                Interception::Deferred
            }
            InputEvent::CompositionEnd { value } => {
                self.composing = false;
                let mutation = self.commit_composition(buffer, value);
                Interception::Mutate { mutation, kind: EditKind::Bulk }
            }
            _ if self.composing => Interception::Deferred,
            InputEvent::Insert { text, sel_start, sel_end } => {
                let input: Vec<char> = text.chars().collect();
                let mutation = self.engine.insert(buffer, to_cp(*sel_start), to_cp(*sel_end), &input);
                Interception::Mutate { mutation, kind: EditKind::Insert }
            }
            InputEvent::Paste { text, sel_start, sel_end } => {
                let input = sanitize_paste(text);
                let mutation =
                    self.engine
                        .insert_via_grammar(buffer, to_cp(*sel_start), to_cp(*sel_end), &input);
                Interception::Mutate { mutation, kind: EditKind::Bulk }
            }
            InputEvent::DeleteBackward { sel_start, sel_end } => {
                let mutation = self.engine.delete_range(
                    buffer,
                    to_cp(*sel_start),
                    to_cp(*sel_end),
                    DeleteDirection::Backward,
                );
                Interception::Mutate { mutation, kind: EditKind::Delete }
            }
            InputEvent::DeleteForward { sel_start, sel_end } => {
                let mutation = self.engine.delete_range(
                    buffer,
                    to_cp(*sel_start),
                    to_cp(*sel_end),
                    DeleteDirection::Forward,
                );
                Interception::Mutate { mutation, kind: EditKind::Delete }
            }
        }
    }

    /// Diff the committed value against the line and re-insert the changed
    /// span through the grammar
    fn commit_composition(&self, buffer: &LineBuffer, value: &str) -> Mutation {
        let old = buffer.chars();
        let new: Vec<char> = value.chars().collect();

        let prefix = old.iter().zip(&new).take_while(|(a, b)| a == b).count();
        let max_suffix = old.len().min(new.len()) - prefix;
        let suffix = old
            .iter()
            .rev()
            .zip(new.iter().rev())
            .take(max_suffix)
            .take_while(|(a, b)| a == b)
            .count();

        let inserted = &new[prefix..new.len() - suffix];
        self.engine
            .insert_via_grammar(buffer, prefix, old.len() - suffix, inserted)
    }
}

/// Line content cannot hold line breaks or control characters
fn sanitize_paste(text: &str) -> Vec<char> {
    text.chars()
        .filter(|c| *c != '\r')
        .map(|c| if c == '\n' || c == '\t' { ' ' } else { c })
        .filter(|c| !c.is_control())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PitchSystem;
    use crate::mutation::{MutationPath, Patch};

    fn interceptor() -> InputInterceptor {
        InputInterceptor::new(CharClasses::for_system(PitchSystem::Number))
    }

    fn mutation(i: Interception) -> Mutation {
        match i {
            Interception::Mutate { mutation, .. } => mutation,
            Interception::Deferred => panic!("expected a mutation"),
        }
    }

    #[test]
    fn test_utf16_selection_is_converted() {
        // barline occupies two code units
        let buf = LineBuffer::from_str("\u{1D100}1");
        let event = InputEvent::Insert { text: "2".into(), sel_start: 3, sel_end: 3 };
        let m = mutation(interceptor().intercept(&buf, &event));
        assert_eq!(m.patch, Patch::insert(2, vec!['2']));
        assert_eq!(m.path, MutationPath::LocalSplice);
    }

    #[test]
    fn test_composition_defers_inserts() {
        let mut ic = interceptor();
        let buf = LineBuffer::from_str("1");
        let start = InputEvent::CompositionStart { sel_start: 1, sel_end: 1, value: Some("1".into()) };
        assert_eq!(ic.intercept(&buf, &start), Interception::Deferred);
        assert!(ic.is_composing());
        let typed = InputEvent::Insert { text: "#".into(), sel_start: 1, sel_end: 1 };
        assert_eq!(ic.intercept(&buf, &typed), Interception::Deferred);
    }

    #[test]
    fn test_composition_end_diffs_and_normalizes() {
        let mut ic = interceptor();
        let buf = LineBuffer::from_str("1 3");
        ic.intercept(&buf, &InputEvent::CompositionStart { sel_start: 1, sel_end: 1, value: None });
        let end = InputEvent::CompositionEnd { value: "1# 3".into() };
        let m = mutation(ic.intercept(&buf, &end));
        // '#' merges into the '1' left of the composed span
        assert_eq!(m.patch, Patch::replace(0, 1, vec!['\u{E019}']));
        assert!(!ic.is_composing());
    }

    #[test]
    fn test_composition_end_without_change_is_noop() {
        let mut ic = interceptor();
        let buf = LineBuffer::from_str("12");
        let m = mutation(ic.intercept(&buf, &InputEvent::CompositionEnd { value: "12".into() }));
        assert!(m.patch.is_noop());
    }

    #[test]
    fn test_paste_strips_line_breaks() {
        let buf = LineBuffer::new();
        let event = InputEvent::Paste { text: "1|2\r\n3".into(), sel_start: 0, sel_end: 0 };
        let m = mutation(interceptor().intercept(&buf, &event));
        assert_eq!(m.patch.replacement, vec!['1', crate::models::glyphs::BARLINE_SINGLE, '2', ' ', '3']);
    }

    #[test]
    fn test_event_deserializes_from_tagged_json() {
        let event: InputEvent =
            serde_json::from_str(r#"{"type":"delete_backward","sel_start":2,"sel_end":2}"#).unwrap();
        assert_eq!(event, InputEvent::DeleteBackward { sel_start: 2, sel_end: 2 });
    }
}
