//! Beat derivation algorithms
//!
//! Grammar:
//! ```text
//! Beat          = TimedElement (BreathMark? TimedElement)*
//! TimedElement  = PitchedElement | UnpitchedElement
//! BeatSeparator = Whitespace | Barline | Symbol | Text
//! ```
//!
//! Superscript groups are rhythm-transparent: a group strictly between two
//! timed elements of one beat is covered by that beat's underline, any other
//! group is an orphan. Every group resolves an attachment to a pitch.

use serde::{Deserialize, Serialize};

use crate::config::BeatConfig;
use crate::error::EngineError;
use crate::models::ElementKind;

/// One derived beat (inclusive codepoint indices)
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct BeatSpan {
    /// First timed element
    pub start: usize,
    /// Last timed element (inclusive)
    pub end: usize,
    /// Underlined extent; None for single-element beats
    pub underline: Option<(usize, usize)>,
}

impl BeatSpan {
    fn new(start: usize, end: usize) -> Self {
        BeatSpan {
            start,
            end,
            underline: (start != end).then_some((start, end)),
        }
    }
}

/// Per-codepoint underline role within a beat
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnderlineState {
    #[default]
    None,
    Left,
    Middle,
    Right,
}

/// Where a superscript group's grace notes belong
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(tag = "kind", content = "pitch", rename_all = "snake_case")]
pub enum Attachment {
    /// Grace notes before the pitch at this index
    Before(usize),
    /// Grace notes after the pitch at this index
    After(usize),
    /// No previous pitch and no adjacent following pitch
    Unattached,
}

/// A maximal run of consecutive superscript codepoints
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SuperscriptGroup {
    pub start: usize,
    /// Inclusive
    pub end: usize,
    /// Not strictly inside any beat
    pub orphan: bool,
    pub attachment: Attachment,
}

/// A condition found while analyzing a line that did not stop the analysis
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    AmbiguousAttachment { start: usize, end: usize },
}

/// Result of running the grammar over one line
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct LineAnalysis {
    pub kinds: Vec<ElementKind>,
    pub beats: Vec<BeatSpan>,
    pub underlines: Vec<UnderlineState>,
    pub groups: Vec<SuperscriptGroup>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Beat deriver for calculating implicit beats from classified codepoints
#[derive(Debug, Clone, Default)]
pub struct BeatDeriver {
    config: BeatConfig,
}

impl BeatDeriver {
    pub fn new(config: BeatConfig) -> Self {
        BeatDeriver { config }
    }

    pub fn config(&self) -> BeatConfig {
        self.config
    }

    /// Run the full grammar over a classified line
    pub fn analyze(&self, kinds: Vec<ElementKind>) -> LineAnalysis {
        let beats = self.extract_implicit_beats(&kinds);
        let underlines = underline_states(&kinds, &beats);
        let (groups, diagnostics) = resolve_superscript_groups(&kinds, &beats);
        LineAnalysis {
            kinds,
            beats,
            underlines,
            groups,
            diagnostics,
        }
    }

    /// Extract implicit beats based on line grammar rules
    ///
    /// A single breath mark between timed elements keeps the beat open; a
    /// second consecutive breath mark closes it (the grammar admits at most
    /// one). Superscripts are skipped entirely.
    pub fn extract_implicit_beats(&self, kinds: &[ElementKind]) -> Vec<BeatSpan> {
        let mut beats = Vec::new();
        let mut beat_start: Option<usize> = None;
        let mut beat_end = 0;
        let mut pending_breaths = 0;

        for (index, kind) in kinds.iter().enumerate() {
            if kind.is_timed() {
                if beat_start.is_none() {
                    beat_start = Some(index);
                }
                beat_end = index;
                pending_breaths = 0;
            } else if kind.is_superscript() {
                continue;
            } else if *kind == ElementKind::BreathMark && !self.config.breath_ends_beat {
                if beat_start.is_some() {
                    pending_breaths += 1;
                    // a beat holds at most one breath mark between elements
                    if pending_breaths > 1 {
                        close_beat(&mut beats, &mut beat_start, beat_end);
                        pending_breaths = 0;
                    }
                }
            } else {
                close_beat(&mut beats, &mut beat_start, beat_end);
                pending_breaths = 0;
            }
        }

        // Handle trailing beat
        close_beat(&mut beats, &mut beat_start, beat_end);
        beats
    }
}

fn close_beat(beats: &mut Vec<BeatSpan>, beat_start: &mut Option<usize>, beat_end: usize) {
    if let Some(start) = beat_start.take() {
        beats.push(BeatSpan::new(start, beat_end));
    }
}

fn underline_states(kinds: &[ElementKind], beats: &[BeatSpan]) -> Vec<UnderlineState> {
    let mut states = vec![UnderlineState::None; kinds.len()];
    for beat in beats {
        let Some((first, last)) = beat.underline else {
            continue;
        };
        for index in first..=last {
            states[index] = if index == first {
                UnderlineState::Left
            } else if index == last {
                UnderlineState::Right
            } else if kinds[index].is_underlined_in_beat() {
                UnderlineState::Middle
            } else {
                UnderlineState::None
            };
        }
    }
    states
}

fn resolve_superscript_groups(
    kinds: &[ElementKind],
    beats: &[BeatSpan],
) -> (Vec<SuperscriptGroup>, Vec<Diagnostic>) {
    let mut groups = Vec::new();
    let mut diagnostics = Vec::new();
    let mut index = 0;

    while index < kinds.len() {
        if !kinds[index].is_superscript() {
            index += 1;
            continue;
        }
        let start = index;
        while index + 1 < kinds.len() && kinds[index + 1].is_superscript() {
            index += 1;
        }
        let end = index;
        index += 1;

        let orphan = !beats.iter().any(|b| b.start < start && end < b.end);

        // breath marks are not separators, so grace notes still reach past them
        let next = (end + 1..kinds.len()).find(|&i| kinds[i] != ElementKind::BreathMark);
        let attachment = if let Some(next) = next.filter(|&i| kinds[i] == ElementKind::PitchedElement) {
            Attachment::Before(next)
        } else if let Some(prev) = (0..start).rev().find(|&i| kinds[i] == ElementKind::PitchedElement) {
            Attachment::After(prev)
        } else {
            log::warn!("{}", EngineError::AmbiguousAttachment { start, end });
            diagnostics.push(Diagnostic::AmbiguousAttachment { start, end });
            Attachment::Unattached
        };

        groups.push(SuperscriptGroup {
            start,
            end,
            orphan,
            attachment,
        });
    }

    (groups, diagnostics)
}
