use std::sync::Arc;

use crate::chat::{Chat, MessageStore};
use crate::core::AppConfig;
use crate::openai::CompletionClient;

/// Everything a request needs. Built once at startup and read-only
/// afterwards.
pub struct AppState {
    pub chat: Chat,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn MessageStore>, config: AppConfig) -> Self {
        let client = CompletionClient::new(&config);
        Self {
            chat: Chat::new(store, client, &config),
            config,
        }
    }
}
