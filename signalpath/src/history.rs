//! Bounded undo/redo ledger of full snapshots.
//!
//! The ledger only hands out snapshots; installing them is the caller's job.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct History<T: Clone> {
    undo: VecDeque<T>,
    redo: VecDeque<T>,
    max_depth: usize,
}

impl<T: Clone> History<T> {
    /// `max_depth` below 1 is treated as 1.
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: VecDeque::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Record the state from before a mutation.
    pub fn commit(&mut self, snapshot: &T) {
        self.push(snapshot.clone());
    }

    /// Like `commit` for a snapshot the caller already owns.
    pub fn push(&mut self, snapshot: T) {
        self.undo.push_back(snapshot);
        while self.undo.len() > self.max_depth {
            self.undo.pop_front();
        }
        self.redo.clear();
    }

    /// Step back. `current` is saved for redo; the returned snapshot should
    /// be installed by the caller.
    pub fn undo(&mut self, current: &T) -> Option<T> {
        let previous = self.undo.pop_back()?;
        self.redo.push_back(current.clone());
        while self.redo.len() > self.max_depth {
            self.redo.pop_front();
        }
        Some(previous)
    }

    pub fn redo(&mut self, current: &T) -> Option<T> {
        let next = self.redo.pop_back()?;
        self.undo.push_back(current.clone());
        while self.undo.len() > self.max_depth {
            self.undo.pop_front();
        }
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
