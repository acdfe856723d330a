//! search-agent HTTP Server
//!
//! Axum server that answers chat requests with a Groq-backed agent, optionally
//! allowed to search the web through Serper.

mod config;
mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{AgentInvoker, LlmProvider, ReactAgentFactory};
use agent_runtime::{GroqProvider, SerperClient};

use crate::config::Settings;
use crate::handlers::{chat_handler, health_check, list_models};
use crate::state::AppState;

/// Routes, CORS and request tracing over the given state
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/models", get(list_models))
        .route("/chat", post(chat_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;
    tracing::debug!(?settings, "Loaded settings");

    let provider: Arc<dyn LlmProvider> = Arc::new(GroqProvider::from_config(settings.groq.clone())?);

    match provider.info().await {
        Ok(info) => {
            tracing::info!("✓ Connected to {} ({} models)", info.name, info.models.len());
            for model in settings.allowed_models.iter().filter(|m| !info.models.iter().any(|i| &i.id == *m)) {
                tracing::warn!("  Allowed model {} is not offered by {}", model, info.name);
            }
        }
        Err(e) => {
            tracing::warn!("⚠ Groq not reachable - requests will fail until it is: {}", e);
            tracing::warn!("  Check GROQ_API_KEY and network access");
        }
    }

    let search = SerperClient::from_config(settings.serper.clone())?;

    let invoker = AgentInvoker::new(Arc::new(ReactAgentFactory::new(provider.clone())))
        .with_search(Arc::new(search));

    let state = AppState {
        invoker: Arc::new(invoker),
        provider,
        allowed_models: Arc::new(settings.allowed_models.clone()),
    };

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;

    tracing::info!("🚀 search-agent server running on http://{}", settings.bind_addr);
    tracing::info!("Allowed models: {}", settings.allowed_models.join(", "));
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health     - Health check");
    tracing::info!("  GET  /api/models - List allowed models");
    tracing::info!("  POST /chat       - Run the agent");

    axum::serve(listener, app).await?;

    Ok(())
}
