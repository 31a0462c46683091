//! Liveness check

use axum::{Json, Router, routing::get};
use serde::{Deserialize, Serialize};

use super::SharedState;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct HealthResponse {
    pub status: String,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: String::from("ok"),
    })
}

/// Create the health router
pub fn router() -> Router<SharedState> {
    Router::new().route("/", get(health_handler))
}
