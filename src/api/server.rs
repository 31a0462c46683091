use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use super::routes;
use crate::api::state::AppState;
use crate::chat::{MessageStore, SqliteStore};
use crate::core::AppConfig;

/// CORS for the configured origins. A `*` entry allows any origin but
/// then credentials can't be allowed.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(origin) => Some(origin),
            Err(_) => {
                tracing::warn!("Ignoring invalid allowed origin {:?}", o);
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
}

pub fn app(shared_state: Arc<AppState>) -> Router {
    let cors = cors_layer(&shared_state.config.allowed_origins);

    Router::new()
        // API routes
        .nest("/api", routes::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::clone(&shared_state))
}

// Run the server
pub async fn serve(host: String, port: String, config: AppConfig) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                // axum logs rejections from built-in extractors with the `axum::rejection`
                // target, at `TRACE` level. `axum::rejection=trace` enables showing those events
                format! {
                    "{}=debug,tower_http=debug,axum::rejection=trace",
                    env!("CARGO_CRATE_NAME")
                }
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store = SqliteStore::open(&config.db_path)
        .await
        .with_context(|| format!("Failed to open db at {}", config.db_path))?;
    store.initialize().await.context("Failed to initialize db")?;

    if config.openrouter_api_key.trim().is_empty() {
        tracing::warn!("OPENROUTER_API_KEY is not set, chat requests will fail");
    }

    let app_state = AppState::new(Arc::new(store), config);
    let app = app(Arc::new(app_state));

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;

    tracing::info!("Server started. Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
