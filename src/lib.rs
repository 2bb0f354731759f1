//! Falcon Chat — console chat front-end with query routing.
//!
//! A user line is routed to arithmetic, web search, or a language model;
//! recent turns are kept as generation context and a flat JSON memory is
//! persisted across sessions.

pub mod comms;
pub mod config;
pub mod error;
pub mod llm;
pub mod logger;
pub mod memory;
pub mod router;
pub mod session;
pub mod system_info;
