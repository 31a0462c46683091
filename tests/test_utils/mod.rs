//! Test utilities for integration tests
#![allow(dead_code)]

use std::sync::Arc;

use axum::{Router, body::Body};
use serde_json::json;
use tempfile::TempDir;

use relay::api::AppState;
use relay::api::app;
use relay::chat::{MessageStore, SqliteStore};
use relay::core::AppConfig;

pub struct TestApp {
    pub router: Router,
    pub store: SqliteStore,
    // Keeps the db directory around for the lifetime of the test
    _dir: TempDir,
}

pub fn test_config(api_hostname: &str, api_key: &str) -> AppConfig {
    let mut config = AppConfig::from_lookup(|_| None).expect("Failed to build config");
    config.openrouter_api_hostname = api_hostname.to_string();
    config.openrouter_api_key = api_key.to_string();
    config.system_message = String::from("You are a helpful assistant.");
    config
}

/// Creates a test application router backed by a SQLite db in a
/// temporary directory. The completion API is expected at
/// `api_hostname` (usually a `mockito` server).
pub async fn test_app(api_hostname: &str, api_key: &str) -> TestApp {
    test_app_with_config(test_config(api_hostname, api_key)).await
}

pub async fn test_app_with_config(mut config: AppConfig) -> TestApp {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("chat_history.db");
    config.db_path = db_path.display().to_string();

    let store = SqliteStore::open(&config.db_path)
        .await
        .expect("Failed to connect to async db");
    store.initialize().await.expect("Failed to initialize db");

    let app_state = AppState::new(Arc::new(store.clone()), config);
    TestApp {
        router: app(Arc::new(app_state)),
        store,
        _dir: dir,
    }
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not utf-8")
}

pub async fn body_to_json(body: Body) -> serde_json::Value {
    serde_json::from_str(&body_to_string(body).await).expect("Body is not json")
}

/// A successful chat completion response with `content` as the reply.
pub fn completion_body(content: &str) -> String {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "created": 1694268190,
        "model": "mistralai/mistral-7b-instruct:free",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": content
            },
            "finish_reason": "stop"
        }]
    })
    .to_string()
}
