//! Bounded history stack with a cursor.

use std::collections::VecDeque;

use tracing::trace;

use super::record::Record;

/// Ordered records plus a cursor
///
/// Records before the cursor are undoable, records at or after it are
/// redoable. Pushing truncates the redo tail; exceeding `max_depth` drops
/// the oldest record.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryStack {
    records: VecDeque<Record>,
    cursor: usize,
    max_depth: usize,
}

impl HistoryStack {
    /// A zero depth is treated as 1
    pub fn new(max_depth: usize) -> Self {
        Self {
            records: VecDeque::new(),
            cursor: 0,
            max_depth: max_depth.max(1),
        }
    }

    pub fn push(&mut self, record: Record) {
        self.records.truncate(self.cursor);
        self.records.push_back(record);

        if self.records.len() > self.max_depth {
            self.records.pop_front();
            trace!("history: dropped oldest record (depth {})", self.max_depth);
        }
        self.cursor = self.records.len();
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.records.len()
    }

    /// Move the cursor back; returns the record to undo
    pub fn step_back(&mut self) -> Option<&Record> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.records.get(self.cursor)
    }

    /// Move the cursor forward; returns the record to redo
    pub fn step_forward(&mut self) -> Option<&Record> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.records.get(self.cursor - 1)
    }

    /// Record the next undo would revert
    pub fn peek_undo(&self) -> Option<&Record> {
        self.cursor.checked_sub(1).and_then(|i| self.records.get(i))
    }

    /// Record the next redo would reapply
    pub fn peek_redo(&self) -> Option<&Record> {
        self.records.get(self.cursor)
    }

    pub fn undo_count(&self) -> usize {
        self.cursor
    }

    pub fn redo_count(&self) -> usize {
        self.records.len() - self.cursor
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{Undoable, ViewChangeRecord};
    use crate::snapshot::ViewSnapshot;

    fn record(label: &str) -> Record {
        Record::View(ViewChangeRecord {
            label: label.to_string(),
            before: ViewSnapshot::default(),
            after: ViewSnapshot::default(),
        })
    }

    #[test]
    fn test_push_truncates_redo_tail() {
        let mut stack = HistoryStack::new(10);
        stack.push(record("a"));
        stack.push(record("b"));
        stack.step_back();
        assert!(stack.can_redo());

        stack.push(record("c"));
        assert!(!stack.can_redo());
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.peek_undo().map(|r| r.label()), Some("c"));
    }

    #[test]
    fn test_depth_drops_oldest() {
        let mut stack = HistoryStack::new(2);
        for label in ["a", "b", "c"] {
            stack.push(record(label));
        }
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.step_back().map(|r| r.label().to_string()).as_deref(), Some("c"));
        assert_eq!(stack.step_back().map(|r| r.label().to_string()).as_deref(), Some("b"));
        assert!(stack.step_back().is_none());
    }

    #[test]
    fn test_cursor_walk() {
        let mut stack = HistoryStack::new(0);
        assert_eq!(stack.max_depth(), 1);
        assert!(stack.step_forward().is_none());

        stack.push(record("a"));
        assert_eq!(stack.undo_count(), 1);
        stack.step_back();
        assert_eq!(stack.redo_count(), 1);
        assert_eq!(stack.peek_redo().map(|r| r.label()), Some("a"));
        assert!(stack.step_forward().is_some());
        assert!(!stack.can_redo());
    }
}
