use anyhow::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::Type;
use tokio_rusqlite::{Connection, params};

use crate::core::db::{TIMESTAMP_FORMAT, async_db, initialize_db};
use crate::openai::Role;
use super::models::{ChatMessage, SessionSummary};

// Rows written by older deployments used SQLite's CURRENT_TIMESTAMP
const LEGACY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only storage of chat messages grouped by session.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Create whatever the store needs. Idempotent.
    async fn initialize(&self) -> Result<(), Error>;

    /// Record one message. The id and timestamp are assigned by the
    /// store.
    async fn append(&self, session_id: &str, role: Role, content: &str) -> Result<(), Error>;

    /// Up to `limit` of the most recent messages for the session,
    /// oldest first. Unknown sessions have no messages.
    async fn recent_messages(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, Error>;

    /// Sessions ordered by most recent activity.
    async fn list_sessions(&self, limit: usize, offset: usize)
    -> Result<Vec<SessionSummary>, Error>;

    async fn session_count(&self) -> Result<i64, Error>;
}

/// SQLite backed store sharing a single connection.
#[derive(Clone)]
pub struct SqliteStore {
    db: Connection,
}

impl SqliteStore {
    pub fn new(db: Connection) -> Self {
        Self { db }
    }

    pub async fn open(db_path: &str) -> Result<Self, Error> {
        Ok(Self::new(async_db(db_path).await?))
    }
}

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, LEGACY_TIMESTAMP_FORMAT))
        .map(|ts| ts.and_utc())
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn chat_message_from_row(row: &rusqlite::Row) -> rusqlite::Result<ChatMessage> {
    let role: String = row.get(2)?;
    let role = role
        .parse::<Role>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
    let timestamp: String = row.get(4)?;

    Ok(ChatMessage {
        id: row.get(0)?,
        session_id: row.get(1)?,
        role,
        content: row.get(3)?,
        timestamp: parse_timestamp(4, &timestamp)?,
    })
}

#[async_trait]
impl MessageStore for SqliteStore {
    async fn initialize(&self) -> Result<(), Error> {
        self.db
            .call(|conn| {
                initialize_db(conn)?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn append(&self, session_id: &str, role: Role, content: &str) -> Result<(), Error> {
        let s_id = session_id.to_owned();
        let content = content.to_owned();
        self.db
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "INSERT INTO chat_messages (session_id, role, content) VALUES (?1, ?2, ?3)",
                )?;
                stmt.execute(params![s_id, role.as_str(), content])?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn recent_messages(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, Error> {
        if limit == 0 {
            return Ok(vec![]);
        }

        let s_id = session_id.to_owned();
        // Take the newest rows then flip them back to insertion order.
        // Ordered by id, not timestamp, so rows written in the same
        // millisecond keep their order.
        let history = self
            .db
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT id, session_id, role, content, timestamp FROM (
                        SELECT id, session_id, role, content, timestamp
                        FROM chat_messages
                        WHERE session_id = ?1
                        ORDER BY id DESC
                        LIMIT ?2
                    )
                    ORDER BY id ASC
                    "#,
                )?;
                let rows = stmt
                    .query_map(params![s_id, limit], chat_message_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;
        Ok(history)
    }

    async fn list_sessions(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SessionSummary>, Error> {
        let sessions = self
            .db
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT session_id, COUNT(*), MAX(timestamp)
                    FROM chat_messages
                    GROUP BY session_id
                    ORDER BY MAX(id) DESC
                    LIMIT ?1 OFFSET ?2
                    "#,
                )?;
                let rows = stmt
                    .query_map(params![limit, offset], |row| {
                        let last_active: String = row.get(2)?;
                        Ok(SessionSummary {
                            session_id: row.get(0)?,
                            message_count: row.get(1)?,
                            last_active: parse_timestamp(2, &last_active)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;
        Ok(sessions)
    }

    async fn session_count(&self) -> Result<i64, Error> {
        let count = self
            .db
            .call(|conn| {
                let mut stmt =
                    conn.prepare("SELECT COUNT(DISTINCT session_id) FROM chat_messages")?;
                let count: i64 = stmt.query_row([], |row| row.get(0))?;
                Ok(count)
            })
            .await?;
        Ok(count)
    }
}
