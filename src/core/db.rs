use std::fs;
use std::path::Path;

use anyhow::{Error, Result};
use tokio_rusqlite::Connection;

/// Format of timestamps assigned by the database (UTC, millisecond
/// precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Open (or create) the SQLite database at `db_path`. Missing parent
/// directories are created.
pub async fn async_db(db_path: &str) -> Result<Connection, Error> {
    if let Some(parent) = Path::new(db_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
    {
        fs::create_dir_all(parent)?;
    }
    let db = Connection::open(db_path).await?;
    Ok(db)
}

/// Create the schema if it doesn't already exist. Safe to run on
/// every startup.
pub fn initialize_db(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS chat_messages (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id TEXT NOT NULL,
            role       TEXT NOT NULL,
            content    TEXT NOT NULL,
            timestamp  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );
        CREATE INDEX IF NOT EXISTS idx_chat_messages_session
            ON chat_messages (session_id, id);
        "#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn it_initializes_twice() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("chat.db");
        let db = async_db(path.to_str().unwrap()).await.unwrap();

        let tables = db
            .call(|conn| {
                initialize_db(conn)?;
                initialize_db(conn)?;
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'chat_messages'",
                    [],
                    |row| row.get(0),
                )?;
                Ok(count)
            })
            .await
            .unwrap();

        assert_eq!(tables, 1);
        assert!(path.exists());
    }
}
