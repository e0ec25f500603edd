//! Bounded undo/redo stack of element-array snapshots.
//!
//! ```text
//! entries: [s0] [s1] [s2] [s3]
//!                      ^ cursor
//! push(s4) → [s0] [s1] [s2] [s4]    (s3 discarded)
//! ```
//!
//! The editor's live elements always equal `entries[cursor]`. Pushing a
//! snapshot equal to the current entry is a no-op, so a click that moves
//! nothing leaves no trace.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::template::TemplateElement;

/// Capacity used by the full editor.
pub const DEFAULT_HISTORY_CAP: usize = 500;

/// Capacity used by the compact editor.
pub const COMPACT_HISTORY_CAP: usize = 50;

/// One committed state.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub elements: Vec<TemplateElement>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    cursor: usize,
    cap: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAP)
    }
}

impl History {
    /// An empty history. A cap of 0 is treated as 1.
    pub fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: 0,
            cap: cap.max(1),
        }
    }

    /// A history seeded with the loaded element array as its first entry.
    pub fn with_initial(elements: Vec<TemplateElement>, cap: usize) -> Self {
        let mut history = Self::new(cap);
        history.push(elements);
        history
    }

    /// Record a committed state.
    ///
    /// Returns `false` when `elements` equals the entry at the cursor and
    /// nothing was recorded.
    pub fn push(&mut self, elements: Vec<TemplateElement>) -> bool {
        if self.current().is_some_and(|current| current == elements.as_slice()) {
            return false;
        }

        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push_back(HistoryEntry {
            elements,
            timestamp: Utc::now(),
        });

        while self.entries.len() > self.cap {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;
        true
    }

    /// Step back one entry. `None` when already at the oldest entry.
    pub fn undo(&mut self) -> Option<&[TemplateElement]> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.current()
    }

    /// Step forward one entry. `None` when already at the newest entry.
    pub fn redo(&mut self) -> Option<&[TemplateElement]> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.current()
    }

    /// The snapshot at the cursor.
    pub fn current(&self) -> Option<&[TemplateElement]> {
        self.entries.get(self.cursor).map(|e| e.elements.as_slice())
    }

    pub fn current_entry(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.entries.is_empty() && self.cursor < self.entries.len() - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Change the cap, evicting the oldest entries first. The entry at the
    /// cursor always survives; redo entries go once nothing older is left.
    pub fn set_cap(&mut self, cap: usize) {
        self.cap = cap.max(1);
        while self.entries.len() > self.cap {
            if self.cursor > 0 {
                self.entries.pop_front();
                self.cursor -= 1;
            } else {
                self.entries.pop_back();
            }
        }
    }
}
