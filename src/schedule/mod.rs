//! Reparse scheduling
//!
//! Decides when dirty lines are run through the beat grammar. Every mutation
//! marks its line at least `DirtyDebounced` and restarts one shared
//! single-shot timer, so a burst of typing coalesces into a single flush.
//! A line is promoted to `DirtyImmediate` after a streak of local-splice
//! insertions or on explicit request; the session flushes right away when
//! any line is immediate.
//!
//! The scheduler holds no clock. The timer is injected behind `FlushTimer`
//! so the browser implementation and tests can drive it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::mutation::MutationPath;
use crate::structure::LineId;

/// A cancellable single-shot timer
pub trait FlushTimer: Send {
    /// Start (or restart) the timer; a pending shot is replaced
    fn arm(&mut self, delay_ms: u32);
    fn cancel(&mut self);
}

/// Timer that never fires; flushes happen only when requested
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTimer;

impl FlushTimer for NoopTimer {
    fn arm(&mut self, _delay_ms: u32) {}
    fn cancel(&mut self) {}
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum LineState {
    #[default]
    Clean,
    DirtyDebounced,
    DirtyImmediate,
}

pub struct ReparseScheduler {
    states: HashMap<LineId, LineState>,
    /// Consecutive local-splice insertions per line since its last flush
    streaks: HashMap<LineId, u32>,
    fast_path_threshold: u32,
    debounce_ms: u32,
    timer: Box<dyn FlushTimer>,
    armed: bool,
}

impl ReparseScheduler {
    pub fn new(fast_path_threshold: u32, debounce_ms: u32, timer: Box<dyn FlushTimer>) -> Self {
        ReparseScheduler {
            states: HashMap::new(),
            streaks: HashMap::new(),
            fast_path_threshold: fast_path_threshold.max(1),
            debounce_ms,
            timer,
            armed: false,
        }
    }

    pub fn state(&self, line: LineId) -> LineState {
        self.states.get(&line).copied().unwrap_or_default()
    }

    pub fn is_timer_armed(&self) -> bool {
        self.armed
    }

    /// Record a mutation on `line` and return its new state
    pub fn note_mutation(&mut self, line: LineId, path: MutationPath) -> LineState {
        let counter = self.streaks.entry(line).or_insert(0);
        if path == MutationPath::LocalSplice {
            *counter += 1;
        } else {
            *counter = 0;
        }
        let streak = *counter;

        if streak >= self.fast_path_threshold {
            log::debug!("line {}: {} local splices, flushing now", line, streak);
            self.promote(line, LineState::DirtyImmediate);
        } else {
            self.promote(line, LineState::DirtyDebounced);
        }
        self.restart_timer();
        self.state(line)
    }

    /// Ask for `line` to be flushed without waiting for the timer
    pub fn request_immediate(&mut self, line: LineId) {
        self.promote(line, LineState::DirtyImmediate);
    }

    fn promote(&mut self, line: LineId, state: LineState) {
        let current = self.states.entry(line).or_default();
        if state > *current {
            *current = state;
        }
    }

    fn restart_timer(&mut self) {
        self.timer.cancel();
        self.timer.arm(self.debounce_ms);
        self.armed = true;
    }

    pub fn needs_immediate_flush(&self) -> bool {
        self.states.values().any(|s| *s == LineState::DirtyImmediate)
    }

    pub fn has_dirty(&self) -> bool {
        self.states.values().any(|s| *s != LineState::Clean)
    }

    /// The pending timer shot was delivered
    pub fn timer_fired(&mut self) {
        self.armed = false;
    }

    /// Take every non-clean line for flushing, returning them all to `Clean`
    pub fn begin_flush(&mut self) -> Vec<LineId> {
        let mut lines: Vec<LineId> = self
            .states
            .iter()
            .filter(|(_, s)| **s != LineState::Clean)
            .map(|(id, _)| *id)
            .collect();
        lines.sort();
        self.states.clear();
        self.streaks.clear();
        if self.armed {
            self.timer.cancel();
            self.armed = false;
        }
        lines
    }

    /// Drop all state for a removed line
    pub fn forget(&mut self, line: LineId) {
        self.states.remove(&line);
        self.streaks.remove(&line);
    }

    /// Cancel the pending timer and clear all state
    pub fn dispose(&mut self) {
        self.timer.cancel();
        self.armed = false;
        self.states.clear();
        self.streaks.clear();
    }
}

impl Drop for ReparseScheduler {
    fn drop(&mut self) {
        if self.armed {
            self.timer.cancel();
        }
    }
}
