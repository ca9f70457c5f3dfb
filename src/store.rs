use std::collections::VecDeque;
use crate::types::{Shape, ShapeList};

/// Owns the current shape list and its snapshot history.
///
/// Every mutation except `undo`, `redo` and `replace` snapshots the current list onto the
/// undo stack and drops the redo stack. The redo stack is ordered most-recent first.
#[derive(Clone, Debug, Default)]
pub struct ShapeStore {
    current: ShapeList,
    undo_stack: Vec<ShapeList>,
    redo_stack: VecDeque<ShapeList>,
    revision: u64,
}

impl ShapeStore {
    pub fn new() -> ShapeStore {
        ShapeStore::default()
    }

    fn save_state(&mut self) {
        self.undo_stack.push(self.current.clone());
        self.redo_stack.clear();
    }

    fn set_current(&mut self, list: ShapeList) {
        self.current = list;
        self.revision += 1;
    }

    /// Appends `batch` in order. An empty batch still records a history entry.
    pub fn add_shapes(&mut self, batch: ShapeList) {
        tracing::debug!(count = batch.len(), "add shapes");
        self.save_state();
        let mut next = self.current.clone();
        next.extend(batch);
        self.set_current(next);
    }

    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.undo_stack.pop() else { return false };
        let current = std::mem::take(&mut self.current);
        self.redo_stack.push_front(current);
        self.set_current(previous);
        tracing::debug!(undo = self.undo_stack.len(), redo = self.redo_stack.len(), "undo");
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo_stack.pop_front() else { return false };
        let current = std::mem::take(&mut self.current);
        self.undo_stack.push(current);
        self.set_current(next);
        tracing::debug!(undo = self.undo_stack.len(), redo = self.redo_stack.len(), "redo");
        true
    }

    pub fn clear(&mut self) {
        tracing::debug!(count = self.current.len(), "clear shapes");
        self.save_state();
        self.set_current(Vec::new());
    }

    /// Installs a loaded list. Loads are not undoable: both stacks are left as they are.
    pub fn replace(&mut self, list: ShapeList) {
        tracing::debug!(count = list.len(), "replace shapes");
        self.set_current(list);
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.current
    }

    pub fn undo_stack(&self) -> &[ShapeList] {
        &self.undo_stack
    }

    pub fn redo_stack(&self) -> &VecDeque<ShapeList> {
        &self.redo_stack
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Bumped whenever the current list is swapped; hosts repaint when it moves.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}
