//! Shared HTTP helpers: client construction and upstream error mapping.

use std::time::Duration;

use agent_core::AgentError;
use reqwest::StatusCode;

/// Build a client with a request timeout
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, AgentError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AgentError::Config(format!("failed to build HTTP client: {e}")))
}

/// What a 404 from an upstream means
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotFound {
    /// The requested model does not exist
    Model,
    /// The endpoint itself is missing
    Endpoint,
}

/// Map a non-success upstream status to a classified error
pub fn status_to_error(service: &str, status: StatusCode, body: &str, not_found: NotFound) -> AgentError {
    let detail = format!("{service} returned {status}: {}", error_message(body));

    match status.as_u16() {
        401 | 403 => AgentError::Auth(detail),
        404 if not_found == NotFound::Model => AgentError::ModelNotFound(detail),
        408 | 504 => AgentError::Timeout(detail),
        429 => AgentError::RateLimited(detail),
        500..=599 => AgentError::ProviderUnavailable(detail),
        _ => AgentError::Provider(detail),
    }
}

/// Map a transport-level reqwest failure
pub fn transport_error(service: &str, err: &reqwest::Error) -> AgentError {
    if err.is_timeout() {
        AgentError::Timeout(format!("{service}: {err}"))
    } else if err.is_connect() {
        AgentError::ProviderUnavailable(format!("{service}: {err}"))
    } else if err.is_decode() {
        AgentError::Parse(format!("{service}: {err}"))
    } else {
        AgentError::Provider(format!("{service}: {err}"))
    }
}

/// Pull `error.message` (or `message`) out of a JSON error body, else the raw body
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message").or(Some(e)))
                .or_else(|| v.get("message"))
                .and_then(|m| m.as_str().map(ToString::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string())
}
