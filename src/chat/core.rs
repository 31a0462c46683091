use std::sync::Arc;

use thiserror::Error;

use crate::core::AppConfig;
use crate::openai::{CompletionClient, CompletionError, Role};
use super::db::MessageStore;
use super::models::Transcript;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    InvalidMessage(String),
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Runs one chat turn: load history, build the prompt, record the
/// user's message, ask the LLM and record its reply.
///
/// The user message is written before the completion call so it is
/// kept even when the call fails. An assistant message is only ever
/// written for a successful reply. Concurrent turns for the same
/// session are not serialized.
pub struct Chat {
    store: Arc<dyn MessageStore>,
    client: CompletionClient,
    system_message: String,
    history_limit: usize,
    max_message_chars: usize,
}

impl Chat {
    pub fn new(store: Arc<dyn MessageStore>, client: CompletionClient, config: &AppConfig) -> Self {
        Self {
            store,
            client,
            system_message: config.system_message.clone(),
            history_limit: config.history_limit,
            max_message_chars: config.max_message_chars,
        }
    }

    pub fn store(&self) -> &Arc<dyn MessageStore> {
        &self.store
    }

    fn validate(&self, message: &str) -> Result<(), ChatError> {
        if message.trim().is_empty() {
            return Err(ChatError::InvalidMessage(String::from(
                "Message cannot be empty",
            )));
        }
        let chars = message.chars().count();
        if chars > self.max_message_chars {
            return Err(ChatError::InvalidMessage(format!(
                "Message is too long ({} characters, the limit is {})",
                chars, self.max_message_chars
            )));
        }
        Ok(())
    }

    /// Get the assistant's reply to `message` in `session_id`.
    pub async fn reply(&self, session_id: &str, message: &str) -> Result<String, ChatError> {
        // Nothing touches the store until the request is known to be
        // serviceable
        self.client.ensure_configured()?;
        self.validate(message)?;

        let history = self
            .store
            .recent_messages(session_id, self.history_limit)
            .await?;
        tracing::debug!(session_id, history = history.len(), "Loaded chat history");

        let transcript = Transcript::assemble(&self.system_message, &history, message);

        self.store.append(session_id, Role::User, message).await?;

        let reply = match self.client.complete(transcript.messages()).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(session_id, "Completion failed: {}", e);
                return Err(e.into());
            }
        };

        self.store.append(session_id, Role::Assistant, &reply).await?;
        tracing::info!(session_id, model = self.client.model(), "Chat turn completed");

        Ok(reply)
    }
}
