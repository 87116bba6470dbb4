use std::collections::VecDeque;

use log::debug;
use serde::{Deserialize, Serialize};

use super::HistoryAction;
use crate::config::EngineConfig;

/// Whether the undo and redo buttons should be enabled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStatus {
    pub can_undo: bool,
    pub can_redo: bool,
}

/// Bounded undo/redo stacks of [`HistoryAction`]s.
///
/// The manager only stores actions. Applying them is up to the caller, which
/// passes a closure to [`undo`](Self::undo) and [`redo`](Self::redo).
#[derive(Debug)]
pub struct HistoryManager {
    /// Oldest first
    undo_stack: VecDeque<HistoryAction>,
    redo_stack: Vec<HistoryAction>,
    max_history: usize,
    max_history_bytes: usize,
    /// Payload bytes across both stacks
    bytes: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        let config = EngineConfig::default();
        Self::new(config.max_history, config.max_history_bytes)
    }
}

impl HistoryManager {
    pub fn new(max_history: usize, max_history_bytes: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_history: max_history.max(1),
            max_history_bytes,
            bytes: 0,
        }
    }

    /// Records a new action, dropping the redo branch and evicting the oldest
    /// actions until both bounds hold again. The new action itself is always kept.
    pub fn add_history(&mut self, action: HistoryAction) {
        let dropped: usize = self.redo_stack.drain(..).map(|a| a.payload_bytes()).sum();
        self.bytes -= dropped;

        self.bytes += action.payload_bytes();
        self.undo_stack.push_back(action);

        while self.undo_stack.len() > 1
            && (self.undo_stack.len() > self.max_history || self.bytes > self.max_history_bytes)
        {
            if let Some(evicted) = self.undo_stack.pop_front() {
                debug!("Evicting oldest history entry ({})", evicted.name());
                self.bytes -= evicted.payload_bytes();
            }
        }
    }

    /// Pops the newest action, hands it to `apply` with `is_undo = true` and
    /// moves it to the redo stack. Returns false when there is nothing to undo.
    pub fn undo(&mut self, mut apply: impl FnMut(&HistoryAction, bool)) -> bool {
        let Some(action) = self.undo_stack.pop_back() else {
            return false;
        };
        debug!("Undo {} on {}", action.name(), action.layer_id());
        apply(&action, true);
        self.redo_stack.push(action);
        true
    }

    /// Counterpart of [`undo`](Self::undo), with `is_undo = false`.
    pub fn redo(&mut self, mut apply: impl FnMut(&HistoryAction, bool)) -> bool {
        let Some(action) = self.redo_stack.pop() else {
            return false;
        };
        debug!("Redo {} on {}", action.name(), action.layer_id());
        apply(&action, false);
        self.undo_stack.push_back(action);
        true
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.bytes = 0;
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Payload bytes currently held
    pub fn memory_usage(&self) -> usize {
        self.bytes
    }

    pub fn status(&self) -> HistoryStatus {
        HistoryStatus {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        }
    }

    /// Actions that can be undone, oldest first
    pub fn undo_actions(&self) -> impl Iterator<Item = &HistoryAction> {
        self.undo_stack.iter()
    }
}
