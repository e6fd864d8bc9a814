//! Bounded linear undo/redo over full snapshots.

use std::collections::VecDeque;

/// Maximum number of snapshots kept, including the current one.
pub const MAX_HISTORY: usize = 30;

#[derive(Debug, Clone)]
pub struct History<T> {
    entries: VecDeque<T>,
    cursor: usize,
}

impl<T: Clone> History<T> {
    pub fn new(initial: T) -> Self {
        let mut entries = VecDeque::with_capacity(MAX_HISTORY);
        entries.push_back(initial);
        Self { entries, cursor: 0 }
    }

    /// Push a snapshot, discarding everything after the cursor.
    pub fn record(&mut self, snapshot: T) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push_back(snapshot);
        while self.entries.len() > MAX_HISTORY {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;
    }

    pub fn undo(&mut self) -> Option<&T> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    pub fn redo(&mut self) -> Option<&T> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }

    /// Forget everything and start over from `snapshot`.
    pub fn reset(&mut self, snapshot: T) {
        self.entries.clear();
        self.entries.push_back(snapshot);
        self.cursor = 0;
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn current(&self) -> &T {
        &self.entries[self.cursor]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_tracks_records() {
        for k in 0..40 {
            let mut history = History::new(0);
            for i in 1..=k {
                history.record(i);
            }
            assert_eq!(history.cursor(), k.min(MAX_HISTORY - 1));
        }
    }

    #[test]
    fn test_undo_back_to_initial() {
        let mut history = History::new("d0".to_string());
        for i in 1..=10 {
            history.record(format!("d{i}"));
        }
        let steps = history.cursor();
        let mut last = None;
        for _ in 0..steps {
            last = history.undo().cloned();
        }
        assert_eq!(last.as_deref(), Some("d0"));
        assert!(history.undo().is_none());
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let mut history = History::new(0);
        history.reset(0);
        for i in 1..35 {
            history.record(i);
        }
        // 35 snapshots in total, 30 survive
        assert_eq!(history.len(), MAX_HISTORY);
        assert_eq!(*history.current(), 34);
        assert!(history.redo().is_none());

        let mut oldest = *history.current();
        while let Some(v) = history.undo() {
            oldest = *v;
        }
        assert_eq!(oldest, 5);
    }

    #[test]
    fn test_fresh_edit_discards_redo_branch() {
        let mut history = History::new("d0");
        history.record("d1");
        history.record("d2");
        assert_eq!(history.undo(), Some(&"d1"));
        history.record("d3");
        assert!(history.redo().is_none());
        assert_eq!(history.undo(), Some(&"d1"));
        assert_eq!(history.redo(), Some(&"d3"));
    }

    #[test]
    fn test_reset_drops_everything() {
        let mut history = History::new(1);
        history.record(2);
        history.record(3);
        history.reset(9);
        assert_eq!(history.len(), 1);
        assert_eq!(history.cursor(), 0);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(*history.current(), 9);
    }
}
