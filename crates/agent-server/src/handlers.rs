//! HTTP Handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use agent_core::{AgentError, ErrorClass, Query};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider_connected: bool,
}

#[derive(Serialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub model_name: String,
    #[serde(default)]
    pub system_prompt: String,
    /// One string or a list of them
    pub messages: Query,
    #[serde(default)]
    pub allow_search: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn reject(status: StatusCode, error: impl Into<String>, code: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

/// HTTP status and error code for an agent failure
pub fn error_status(err: &AgentError) -> (StatusCode, &'static str) {
    match err {
        AgentError::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
        AgentError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "UPSTREAM_TIMEOUT"),
        _ if err.class() == ErrorClass::Transient => (StatusCode::SERVICE_UNAVAILABLE, "UPSTREAM_UNAVAILABLE"),
        AgentError::Provider(_)
        | AgentError::Auth(_)
        | AgentError::ModelNotFound(_)
        | AgentError::Parse(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "AGENT_ERROR"),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider_connected = state.provider.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider_connected,
    })
}

/// Models a chat request may name
pub async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.allowed_models.as_ref().clone(),
    })
}

/// Run the agent over the request and return its final reply
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if !state.is_allowed(&payload.model_name) {
        tracing::warn!(model = %payload.model_name, "Rejected unknown model");
        return Err(reject(StatusCode::BAD_REQUEST, "Invalid model name", "INVALID_MODEL"));
    }

    if payload.messages.is_empty() {
        return Err(reject(StatusCode::BAD_REQUEST, "Query must not be empty", "EMPTY_QUERY"));
    }

    tracing::info!(
        model = %payload.model_name,
        allow_search = payload.allow_search,
        messages = payload.messages.utterances().len(),
        "Chat request"
    );

    let response = state
        .invoker
        .invoke(
            &payload.model_name,
            payload.messages,
            payload.allow_search,
            &payload.system_prompt,
        )
        .await
        .map_err(|e| {
            tracing::error!("Agent error: {}", e);
            let (status, code) = error_status(&e);
            reject(status, e.user_message(), code)
        })?;

    Ok(Json(ChatResponse { response }))
}
