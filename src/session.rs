//! Per-conversation context handed to the router.

use crate::error::AppError;
use crate::memory::{LongTermMemory, ShortTermHistory};

/// Both memory stores for one conversation.
///
/// Owned by a single channel and borrowed mutably for the length of one
/// request, so no locking is needed.
#[derive(Debug)]
pub struct Session {
    pub history: ShortTermHistory,
    pub memory: LongTermMemory,
}

impl Session {
    pub fn new(history: ShortTermHistory, memory: LongTermMemory) -> Self {
        Self { history, memory }
    }

    /// Drop short-term history. Long-term memory is untouched.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn save_memory(&self) -> Result<(), AppError> {
        self.memory.save()
    }
}
