//! API routes module

pub mod chat;
pub mod health;

use std::sync::Arc;

use crate::api::state::AppState;
use axum::Router;

pub type SharedState = Arc<AppState>;

/// Create the combined API router
pub fn router() -> Router<SharedState> {
    Router::new()
        // Liveness
        .nest("/health", health::router())
        // Chat routes
        .nest("/chat", chat::router())
}
