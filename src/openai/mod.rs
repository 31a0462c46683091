//! Client for OpenAI compatible chat completion APIs (OpenRouter by
//! default).
mod core;

pub use self::core::{CompletionClient, CompletionError, Message, Role, UnknownRole, extract_reply};
