//! Public types for the chat API
use serde::{Deserialize, Serialize};

use crate::chat::{ChatMessage, SessionSummary};

pub const DEFAULT_SESSION_ID: &str = "default";

/// Session ids that collide with a fixed route under `/api/chat` and so
/// could never be read back by id.
pub const RESERVED_SESSION_IDS: &[&str] = &["sessions"];

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: Option<String>,
}

impl ChatRequest {
    /// The session to use, falling back to the shared default session
    /// when none (or a blank one) was sent.
    pub fn session_id(&self) -> String {
        match &self.session_id {
            Some(s) if !s.trim().is_empty() => s.clone(),
            _ => DEFAULT_SESSION_ID.to_string(),
        }
    }
}

pub fn is_reserved_session_id(session_id: &str) -> bool {
    RESERVED_SESSION_IDS.contains(&session_id)
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
}

#[derive(Deserialize)]
pub struct ChatTranscriptQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ChatTranscriptResponse {
    pub session_id: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
pub struct ChatSessionsQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ChatSessionsResponse {
    pub sessions: Vec<SessionSummary>,
    pub page: usize,
    pub limit: usize,
    pub total_sessions: i64,
    pub total_pages: i64,
}
