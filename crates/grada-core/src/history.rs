use std::collections::VecDeque;

use crate::settings::ColorGradingSettings;

/// Default number of snapshots kept per editing session.
pub const DEFAULT_MAX_HISTORY: usize = 50;

/// Linear undo/redo stack of settings snapshots.
///
/// Always holds at least one state and `index < len()`. Pushing past
/// capacity evicts the oldest state; pushing after an undo discards the
/// states ahead of the index.
#[derive(Clone, Debug)]
pub struct ColorGradingHistory {
    states: VecDeque<ColorGradingSettings>,
    index: usize,
    capacity: usize,
}

impl ColorGradingHistory {
    /// Start with `initial` as the only state. Capacity is at least 1.
    pub fn new(initial: ColorGradingSettings, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut states = VecDeque::with_capacity(capacity.min(DEFAULT_MAX_HISTORY));
        states.push_back(initial);
        Self {
            states,
            index: 0,
            capacity,
        }
    }

    pub fn current(&self) -> &ColorGradingSettings {
        &self.states[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn push(&mut self, settings: ColorGradingSettings) {
        self.states.truncate(self.index + 1);
        self.states.push_back(settings);
        while self.states.len() > self.capacity {
            self.states.pop_front();
        }
        self.index = self.states.len() - 1;
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.states.len()
    }

    /// Step back. `None` at the oldest state.
    pub fn undo(&mut self) -> Option<&ColorGradingSettings> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        Some(self.current())
    }

    /// Step forward. `None` at the newest state.
    pub fn redo(&mut self) -> Option<&ColorGradingSettings> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        Some(self.current())
    }
}

impl Default for ColorGradingHistory {
    fn default() -> Self {
        Self::new(ColorGradingSettings::default(), DEFAULT_MAX_HISTORY)
    }
}
