//! In-game message channel.
//!
//! User-visible narration ("door cannot be opened", drops, damage lines) is
//! appended here. The channel is a bounded ring: once full, the oldest line
//! is discarded. Every line is mirrored to `tracing` under the `gamelog`
//! target so headless sessions can follow the game from the log output.

use std::collections::VecDeque;

use crate::config::GameConfig;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameLog {
    field: VecDeque<String>,
    capacity: usize,
}

impl GameLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            field: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Appends a line to the field log.
    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::info!(target: "gamelog", "{line}");
        if self.field.len() == self.capacity {
            self.field.pop_front();
        }
        self.field.push_back(line);
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.field.iter().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.field.back().map(String::as_str)
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.field.iter().any(|line| line.contains(needle))
    }

    pub fn len(&self) -> usize {
        self.field.len()
    }

    pub fn is_empty(&self) -> bool {
        self.field.is_empty()
    }

    pub fn clear(&mut self) {
        self.field.clear();
    }
}

impl Default for GameLog {
    fn default() -> Self {
        Self::new(GameConfig::FIELD_LOG_CAPACITY)
    }
}
