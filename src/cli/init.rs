use anyhow::Result;

use crate::chat::{MessageStore, SqliteStore};

pub async fn run(db_path: &str) -> Result<()> {
    println!("Initializing db at {}...", db_path);
    let store = SqliteStore::open(db_path).await?;
    store.initialize().await?;
    println!("Finished initializing db");
    Ok(())
}
