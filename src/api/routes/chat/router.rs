//! Router for the chat API

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_extra::extract::Query;

use crate::api::public::{ApiError, ApiJson};
use super::super::SharedState;
use super::public;

const DEFAULT_TRANSCRIPT_LIMIT: usize = 50;
const MAX_TRANSCRIPT_LIMIT: usize = 500;

/// Send a message and get the assistant's reply
async fn chat_handler(
    State(state): State<SharedState>,
    ApiJson(payload): ApiJson<public::ChatRequest>,
) -> Result<Json<public::ChatResponse>, ApiError> {
    let session_id = payload.session_id();
    if public::is_reserved_session_id(&session_id) {
        return Err(ApiError::BadRequest(format!(
            "Session id {} is reserved",
            session_id
        )));
    }
    let response = state.chat.reply(&session_id, &payload.message).await?;

    Ok(Json(public::ChatResponse {
        response,
        session_id,
    }))
}

/// Get the most recent messages of a chat session
async fn chat_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(params): Query<public::ChatTranscriptQuery>,
) -> Result<Json<public::ChatTranscriptResponse>, ApiError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_TRANSCRIPT_LIMIT)
        .min(MAX_TRANSCRIPT_LIMIT);
    let messages = state.chat.store().recent_messages(&id, limit).await?;

    if messages.is_empty() {
        return Err(ApiError::NotFound(format!("Chat session {} not found", id)));
    }

    Ok(Json(public::ChatTranscriptResponse {
        session_id: id,
        messages,
    }))
}

/// Get a page of chat sessions, most recently active first
async fn chat_list(
    State(state): State<SharedState>,
    Query(params): Query<public::ChatSessionsQuery>,
) -> Result<Json<public::ChatSessionsResponse>, ApiError> {
    let store = state.chat.store();
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * limit;
    let total_sessions = store.session_count().await?;
    let sessions = store.list_sessions(limit, offset).await?;
    let total_pages = (total_sessions as f64 / limit as f64).ceil() as i64;

    Ok(Json(public::ChatSessionsResponse {
        sessions,
        page,
        limit,
        total_sessions,
        total_pages,
    }))
}

/// Create the chat router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", post(chat_handler))
        .route("/sessions", get(chat_list))
        .route("/{id}", get(chat_session))
}
