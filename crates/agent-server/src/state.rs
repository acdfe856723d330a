//! Application State

use std::sync::Arc;

use agent_core::{AgentInvoker, LlmProvider};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Builds and runs one agent per request
    pub invoker: Arc<AgentInvoker>,

    /// LLM provider, kept for health checks
    pub provider: Arc<dyn LlmProvider>,

    /// Models a request may name
    pub allowed_models: Arc<Vec<String>>,
}

impl AppState {
    pub fn is_allowed(&self, model: &str) -> bool {
        self.allowed_models.iter().any(|m| m == model)
    }
}
