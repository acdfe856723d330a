//! Web Search Capability
//!
//! The single tool an agent may be given: free-text query in, search results
//! as text out. The actual search backend sits behind [`SearchProvider`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::tool::{ParameterSchema, Tool, ToolCall, ToolResult, ToolSchema};

/// Name the model sees for the search tool
pub const SEARCH_TOOL_NAME: &str = "Search";

const SEARCH_TOOL_DESCRIPTION: &str =
    "Useful for when you need to answer questions about current events";

/// Backend that turns a query into search results text
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<String>;
}

/// Tool wrapping a [`SearchProvider`]
pub struct WebSearchTool {
    provider: Arc<dyn SearchProvider>,
}

impl WebSearchTool {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: SEARCH_TOOL_NAME.into(),
            description: SEARCH_TOOL_DESCRIPTION.into(),
            parameters: vec![ParameterSchema {
                name: "query".into(),
                param_type: "string".into(),
                description: "Search query".into(),
                required: true,
            }],
        }
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let query = call.str_arg("query").unwrap_or_default().trim();
        if query.is_empty() {
            return Ok(ToolResult::failure(SEARCH_TOOL_NAME, "Empty search query"));
        }

        tracing::debug!(%query, "Running web search");
        let output = self.provider.search(query).await?;

        Ok(ToolResult::success(SEARCH_TOOL_NAME, output))
    }
}
