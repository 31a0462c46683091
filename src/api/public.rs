//! Public API types

use axum::Json;
use axum::extract::FromRequest;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde_json::json;

use crate::chat::ChatError;
use crate::openai::CompletionError;

// Extractors

/// JSON request body whose rejections are reported as `ApiError` so
/// they get the same `{"detail": ...}` shape as every other error.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

// Errors

#[derive(Debug)]
pub enum ApiError {
    Chat(ChatError),
    BadRequest(String),
    InvalidBody(JsonRejection),
    NotFound(String),
    Internal(anyhow::Error),
}

impl ApiError {
    /// Status code and the short message shown to the caller.
    fn status_and_detail(&self) -> (StatusCode, String) {
        match self {
            ApiError::Chat(ChatError::InvalidMessage(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Chat(ChatError::Completion(e)) => match e {
                CompletionError::MissingCredential => {
                    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
                }
                CompletionError::Upstream { status } => {
                    (*status, String::from("Completion API error"))
                }
                CompletionError::Malformed(_) => (
                    StatusCode::BAD_GATEWAY,
                    String::from("Unexpected response format from completion API"),
                ),
                CompletionError::Timeout => (
                    StatusCode::GATEWAY_TIMEOUT,
                    String::from("Completion API timed out"),
                ),
                CompletionError::Transport(_) => (
                    StatusCode::BAD_GATEWAY,
                    String::from("Could not reach completion API"),
                ),
            },
            ApiError::Chat(ChatError::Storage(_)) | ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                String::from("Something went wrong"),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            // Missing fields, bad JSON and the wrong content type are all
            // unprocessable
            ApiError::InvalidBody(rejection) => {
                (StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
        }
    }
}

/// Convert `ApiError` into an Axum compatible response with a
/// `{"detail": ...}` body.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = self.status_and_detail();

        // Always log the error, with the full cause for server side
        // failures
        match &self {
            ApiError::Chat(e) if status.is_server_error() => tracing::error!("{}", e),
            ApiError::Internal(e) => tracing::error!("{:#}", e),
            _ => tracing::warn!("{}: {}", status, detail),
        }

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        Self::Chat(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody(rejection)
    }
}

/// Enables using `?` on functions that return `Result<_,
/// anyhow::Error>` in handlers.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

// Re-export public types from each route

pub mod chat {
    pub use crate::api::routes::chat::public::*;
}

pub mod health {
    pub use crate::api::routes::health::HealthResponse;
}
