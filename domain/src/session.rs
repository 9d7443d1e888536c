use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::technique::Technique;

/// A retrieved chunk as shown under an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceExcerpt {
    pub source: String,
    pub excerpt: String,
    pub score: f32,
}

/// One completed exchange. Never edited after it is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// `None` for plain chat turns.
    pub technique: Option<Technique>,
    pub prompt: String,
    pub answer: String,
    pub model: String,
    pub latency: Duration,
    pub sources: Vec<SourceExcerpt>,
}

/// Session-scoped, append-only history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    history: Vec<ConversationTurn>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            history: Vec::new(),
        }
    }

    pub fn record(&mut self, turn: ConversationTurn) {
        self.history.push(turn);
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    /// Turns recorded without a technique, i.e. the plain chat transcript.
    pub fn chat_history(&self) -> Vec<ConversationTurn> {
        self.history
            .iter()
            .filter(|turn| turn.technique.is_none())
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}
