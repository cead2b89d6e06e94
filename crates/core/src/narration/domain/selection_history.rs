use std::collections::VecDeque;

use crate::shared::constants::SELECTION_HISTORY;

/// Most-recently-used phrases, newest first.
#[derive(Clone, Debug)]
pub struct SelectionHistory {
    recent: VecDeque<String>,
    capacity: usize,
}

impl SelectionHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            recent: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Moves `phrase` to the front, dropping the oldest entry past capacity.
    pub fn record(&mut self, phrase: &str) {
        if let Some(pos) = self.position(phrase) {
            self.recent.remove(pos);
        }
        self.recent.push_front(phrase.to_string());
        self.recent.truncate(self.capacity);
    }

    /// 0 for the most recent phrase.
    pub fn position(&self, phrase: &str) -> Option<usize> {
        self.recent.iter().position(|p| p == phrase)
    }

    /// Draw weight for a phrase: 1 when not recent, otherwise
    /// `1 / (position + 2)`, so the latest pick weighs 1/2.
    pub fn weight(&self, phrase: &str) -> f64 {
        match self.position(phrase) {
            Some(pos) => 1.0 / (pos as f64 + 2.0),
            None => 1.0,
        }
    }

    pub fn len(&self) -> usize {
        self.recent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }

    pub fn clear(&mut self) {
        self.recent.clear();
    }
}

impl Default for SelectionHistory {
    fn default() -> Self {
        Self::new(SELECTION_HISTORY)
    }
}
