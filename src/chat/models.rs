//! The core models for a stateful chat session.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::openai::{Message, Role};

/// One stored turn of a conversation. Never modified once written.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub id: i64,
    pub session_id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn to_message(&self) -> Message {
        Message::new(self.role, &self.content)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionSummary {
    pub session_id: String,
    pub message_count: i64,
    pub last_active: DateTime<Utc>,
}

/// The ordered list of messages sent to the LLM for one turn.
#[derive(Default, Debug, PartialEq)]
pub struct Transcript(Vec<Message>);

impl Transcript {
    /// Build the prompt for the next turn: the system message, then
    /// the stored history in the order given, then the new user
    /// message. Nothing is reordered, deduplicated or truncated.
    pub fn assemble(system_message: &str, history: &[ChatMessage], user_message: &str) -> Self {
        let mut transcript = Self(Vec::with_capacity(history.len() + 2));
        transcript.push(Message::new(Role::System, system_message));
        for msg in history {
            transcript.push(msg.to_message());
        }
        transcript.push(Message::new(Role::User, user_message));
        transcript
    }

    pub fn messages(&self) -> &[Message] {
        &self.0
    }

    fn push(&mut self, msg: Message) {
        self.0.push(msg)
    }
}
