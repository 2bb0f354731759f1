//! Bounded short-term history.

use std::collections::VecDeque;

use crate::config::DEFAULT_HISTORY_CAP;

/// Who produced a history line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    Question,
    Answer,
}

impl Speaker {
    fn prefix(self) -> &'static str {
        match self {
            Speaker::Question => "Q",
            Speaker::Answer => "A",
        }
    }
}

/// FIFO buffer of `"Q: …"` / `"A: …"` lines.
///
/// Never holds more than `cap` lines: each push evicts from the front until
/// the length is back within the cap.
#[derive(Debug, Clone)]
pub struct ShortTermHistory {
    lines: VecDeque<String>,
    cap: usize,
}

impl ShortTermHistory {
    /// `cap` is clamped to at least 1.
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self { lines: VecDeque::with_capacity(cap + 1), cap }
    }

    pub fn push(&mut self, speaker: Speaker, text: &str) {
        self.lines.push_back(format!("{}: {text}", speaker.prefix()));
        while self.lines.len() > self.cap {
            self.lines.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// All retained lines joined by newlines, oldest first.
    pub fn context(&self) -> String {
        self.lines().collect::<Vec<_>>().join("\n")
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }
}

impl Default for ShortTermHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAP)
    }
}
