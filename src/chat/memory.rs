use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;

use crate::openai::Role;
use super::db::MessageStore;
use super::models::{ChatMessage, SessionSummary};

/// In-process `MessageStore`. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    messages: RwLock<Vec<ChatMessage>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored message in insertion order.
    pub fn all(&self) -> Result<Vec<ChatMessage>, Error> {
        Ok(self.read()?.clone())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<ChatMessage>>, Error> {
        self.messages
            .read()
            .map_err(|_| anyhow!("Memory store lock poisoned"))
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn initialize(&self) -> Result<(), Error> {
        Ok(())
    }

    async fn append(&self, session_id: &str, role: Role, content: &str) -> Result<(), Error> {
        let mut messages = self
            .messages
            .write()
            .map_err(|_| anyhow!("Memory store lock poisoned"))?;
        let id = messages.last().map(|m| m.id + 1).unwrap_or(1);
        messages.push(ChatMessage {
            id,
            session_id: session_id.to_string(),
            role,
            content: content.to_string(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    async fn recent_messages(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, Error> {
        let messages = self.read()?;
        let mut recent: Vec<ChatMessage> = messages
            .iter()
            .rev()
            .filter(|m| m.session_id == session_id)
            .take(limit)
            .cloned()
            .collect();
        recent.reverse();
        Ok(recent)
    }

    async fn list_sessions(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SessionSummary>, Error> {
        let messages = self.read()?;
        // Walking newest first means the first time a session is seen
        // is its most recent activity.
        let mut order: Vec<String> = Vec::new();
        let mut summaries: HashMap<String, SessionSummary> = HashMap::new();
        for msg in messages.iter().rev() {
            summaries
                .entry(msg.session_id.clone())
                .and_modify(|s| s.message_count += 1)
                .or_insert_with(|| {
                    order.push(msg.session_id.clone());
                    SessionSummary {
                        session_id: msg.session_id.clone(),
                        message_count: 1,
                        last_active: msg.timestamp,
                    }
                });
        }

        Ok(order
            .into_iter()
            .skip(offset)
            .take(limit)
            .filter_map(|id| summaries.remove(&id))
            .collect())
    }

    async fn session_count(&self) -> Result<i64, Error> {
        let messages = self.read()?;
        let mut ids: Vec<&str> = messages.iter().map(|m| m.session_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids.len() as i64)
    }
}
