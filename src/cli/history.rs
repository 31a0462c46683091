use anyhow::Result;

use crate::chat::{MessageStore, SqliteStore};

pub async fn run(db_path: &str, session_id: &str, limit: usize) -> Result<()> {
    let store = SqliteStore::open(db_path).await?;
    store.initialize().await?;

    let messages = store.recent_messages(session_id, limit).await?;
    if messages.is_empty() {
        println!("No messages for session {}", session_id);
        return Ok(());
    }

    for msg in messages {
        println!(
            "[{}] {}: {}",
            msg.timestamp.format("%Y-%m-%d %H:%M:%S"),
            msg.role,
            msg.content
        );
    }

    Ok(())
}
