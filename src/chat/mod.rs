//! Session history, prompt assembly and the chat turn itself.
mod core;
mod db;
mod memory;
mod models;

pub use self::core::{Chat, ChatError};
pub use db::{MessageStore, SqliteStore};
pub use memory::MemoryStore;
pub use models::{ChatMessage, SessionSummary, Transcript};
