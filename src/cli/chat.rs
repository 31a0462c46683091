use std::sync::Arc;

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use uuid::Uuid;

use crate::chat::{Chat, MemoryStore, MessageStore, SqliteStore};
use crate::core::AppConfig;
use crate::openai::CompletionClient;

/// Chat in the terminal using the same store and prompt as the API
/// server. With `ephemeral` the history only lives as long as the
/// process.
pub async fn run(config: AppConfig, session_id: Option<String>, ephemeral: bool) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    let store: Arc<dyn MessageStore> = if ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(SqliteStore::open(&config.db_path).await?)
    };
    store.initialize().await?;

    let session_id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let client = CompletionClient::new(&config);
    let chat = Chat::new(store, client, &config);

    println!("Session {} (Ctrl-D to quit)", session_id);

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());
                match chat.reply(&session_id, &line).await {
                    Ok(reply) => println!("{}", reply),
                    Err(e) => println!("Error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
