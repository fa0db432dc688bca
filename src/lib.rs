//! A terminal assistant for OpenAI-compatible chat and image APIs.
//!
//! Conversations are kept as JSON files on disk, and the last text
//! conversation is picked up again on the next run.

pub mod chat;
pub mod client;
pub mod error;
pub mod history;
pub mod observability;
pub mod render;
pub mod types;
pub mod utils;

pub use client::OpenAi;
pub use error::{Error, Result};
pub use history::{HistoryEntry, HistoryStore, LastSavedPointer, SessionRecord};
pub use types::*;
