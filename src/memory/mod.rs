//! Conversation memory.
//!
//! Two stores with very different lifetimes:
//!
//! - [`ShortTermHistory`]: bounded `Q:`/`A:` buffer, process-lifetime only,
//!   fed to the generation handler as context.
//! - [`LongTermMemory`]: unbounded JSON key-value map, loaded once at startup
//!   and rewritten wholesale on save.

mod history;
mod long_term;

pub use history::{ShortTermHistory, Speaker};
pub use long_term::LongTermMemory;
