//! Outbound notifications to the host
//!
//! The engine never calls into the UI. It queues events that the host drains
//! after each call. The queue is bounded: identical pending events are
//! coalesced, and on overflow the oldest event is dropped.

use std::collections::VecDeque;

use serde::Serialize;

use crate::structure::LineId;

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Line content changed
    LineChanged { line: LineId },
    /// Fresh grammar results are available for the line
    RenderNeeded { line: LineId },
    /// Row order changed; `order` lists line ids by row
    LinesRenumbered { order: Vec<LineId> },
}

#[derive(Debug, Clone)]
pub struct EventQueue {
    events: VecDeque<EngineEvent>,
    capacity: usize,
    dropped: u64,
}

impl EventQueue {
    pub fn new(capacity: usize) -> Self {
        EventQueue {
            events: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    pub fn push(&mut self, event: EngineEvent) {
        if let EngineEvent::LinesRenumbered { .. } = event {
            // only the latest order matters
            self.events.retain(|e| !matches!(e, EngineEvent::LinesRenumbered { .. }));
        } else if self.events.contains(&event) {
            return;
        }

        if self.events.len() >= self.capacity {
            if let Some(oldest) = self.events.pop_front() {
                self.dropped += 1;
                log::warn!("event queue full ({}), dropped {:?}", self.capacity, oldest);
            }
        }
        self.events.push_back(event);
    }

    /// Take all pending events in arrival order
    pub fn drain(&mut self) -> Vec<EngineEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of events lost to overflow since creation
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(index: u32) -> LineId {
        LineId { index, generation: 0 }
    }

    #[test]
    fn test_duplicates_coalesce() {
        let mut queue = EventQueue::new(8);
        queue.push(EngineEvent::LineChanged { line: line(0) });
        queue.push(EngineEvent::LineChanged { line: line(0) });
        queue.push(EngineEvent::RenderNeeded { line: line(0) });
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let mut queue = EventQueue::new(2);
        queue.push(EngineEvent::LineChanged { line: line(0) });
        queue.push(EngineEvent::LineChanged { line: line(1) });
        queue.push(EngineEvent::LineChanged { line: line(2) });
        assert_eq!(queue.dropped(), 1);
        assert_eq!(
            queue.drain(),
            vec![
                EngineEvent::LineChanged { line: line(1) },
                EngineEvent::LineChanged { line: line(2) },
            ]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_renumbering_keeps_latest_order() {
        let mut queue = EventQueue::new(8);
        queue.push(EngineEvent::LinesRenumbered { order: vec![line(0)] });
        queue.push(EngineEvent::LineChanged { line: line(0) });
        queue.push(EngineEvent::LinesRenumbered { order: vec![line(1), line(0)] });
        assert_eq!(
            queue.drain(),
            vec![
                EngineEvent::LineChanged { line: line(0) },
                EngineEvent::LinesRenumbered { order: vec![line(1), line(0)] },
            ]
        );
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(EngineEvent::RenderNeeded { line: line(3) }).unwrap();
        assert_eq!(json["type"], "render_needed");
        assert_eq!(json["line"]["index"], 3);
    }
}
