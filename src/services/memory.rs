//! Conversation memory: the single source of truth for prior turns.

use std::collections::VecDeque;

use crate::models::ConversationTurn;

/// Ordered log of (question, answer) turns for one session.
///
/// Unbounded by default; `max_turns` enables FIFO eviction of the
/// oldest turns to bound prompt size (config key
/// `query.max_history_turns`).
#[derive(Debug, Clone, Default)]
pub struct ConversationMemory {
    turns: VecDeque<ConversationTurn>,
    max_turns: Option<usize>,
}

impl ConversationMemory {
    pub fn new(max_turns: Option<usize>) -> Self {
        Self {
            turns: VecDeque::new(),
            max_turns,
        }
    }

    /// Append a completed turn, evicting the oldest when over capacity.
    pub fn append(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.turns.push_back(ConversationTurn::new(question, answer));

        if let Some(max) = self.max_turns {
            while self.turns.len() > max {
                self.turns.pop_front();
            }
        }
    }

    /// All remembered turns, oldest first.
    pub fn history(&self) -> Vec<ConversationTurn> {
        self.turns.iter().cloned().collect()
    }

    pub fn reset(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
