//! Reasoning Loop
//!
//! Implements the ReAct (Reason + Act) pattern for agent behavior.
//! The agent asks the model, runs any tools it requests, feeds the results
//! back, and stops at the first completion that requests no tools.
//!
//! The loop is an injected strategy: [`AgentFactory`] builds a
//! [`ConversationRunner`] from a model id and a tool set, and callers only ever
//! see `run(conversation) -> conversation`.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;

use crate::error::{AgentError, Result};
use crate::message::{Conversation, Message};
use crate::provider::{GenerationOptions, LlmProvider};
use crate::tool::{ToolCall, ToolRegistry, ToolResult};

/// Something that drives a conversation to a terminal state
#[async_trait]
pub trait ConversationRunner: Send + Sync {
    /// Run to completion, returning the full resulting message list
    async fn run(&self, conversation: Conversation) -> Result<Conversation>;
}

/// Builds a fresh agent per invocation
pub trait AgentFactory: Send + Sync {
    fn create_agent(&self, model_id: &str, tools: ToolRegistry) -> Box<dyn ConversationRunner>;
}

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Maximum reasoning iterations before giving up
    pub max_iterations: usize,

    /// Generation options
    pub generation: GenerationOptions,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            generation: GenerationOptions::default(),
        }
    }
}

/// The main Agent struct
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    /// Run the reasoning loop on a conversation
    pub async fn run(&self, mut conversation: Conversation) -> Result<Conversation> {
        let schemas = self.tools.schemas();
        let model = &self.config.generation.model;

        for iteration in 1..=self.config.max_iterations {
            let completion = self
                .provider
                .complete(conversation.messages(), &schemas, &self.config.generation)
                .await?;

            tracing::debug!(
                %model,
                iteration,
                tool_calls = completion.tool_calls.len(),
                "Model turn complete"
            );

            if !completion.wants_tools() {
                conversation.push(Message::assistant(completion.content).with_model(model));
                return Ok(conversation);
            }

            let calls: Vec<ToolCall> = completion
                .tool_calls
                .into_iter()
                .map(|mut call| {
                    if call.id.is_none() {
                        call.id = Some(uuid::Uuid::new_v4().to_string());
                    }
                    call
                })
                .collect();

            conversation.push(
                Message::assistant(completion.content)
                    .with_tool_calls(calls.clone())
                    .with_model(model),
            );

            let results = join_all(calls.iter().map(|call| self.execute_tool(call))).await;
            for (call, result) in calls.iter().zip(results) {
                let result = result?;
                conversation.push(Message::tool(Self::format_tool_result(&result), call.id.clone()));
            }
        }

        Err(AgentError::MaxIterations(self.config.max_iterations))
    }

    /// Execute a tool call.
    ///
    /// Bad calls from the model are reported back to it as a failed result;
    /// upstream failures (auth, network, rate limits) abort the run.
    async fn execute_tool(&self, call: &ToolCall) -> Result<ToolResult> {
        tracing::debug!(tool = %call.name, "Executing tool");

        match self.tools.execute(call).await {
            Ok(mut result) => {
                result.id.clone_from(&call.id);
                Ok(result)
            }
            Err(
                e @ (AgentError::ToolNotFound(_)
                | AgentError::ToolValidation(_)
                | AgentError::ToolExecution(_)),
            ) => {
                tracing::warn!(tool = %call.name, error = %e, "Tool call failed");
                Ok(ToolResult {
                    name: call.name.clone(),
                    id: call.id.clone(),
                    success: false,
                    output: format!("Error: {e}"),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Format tool result for conversation
    fn format_tool_result(result: &ToolResult) -> String {
        if result.success {
            result.output.clone()
        } else {
            format!("[Tool '{}' failed]\n{}", result.name, result.output)
        }
    }
}

#[async_trait]
impl ConversationRunner for Agent {
    async fn run(&self, conversation: Conversation) -> Result<Conversation> {
        Self::run(self, conversation).await
    }
}

/// Default factory: a ReAct [`Agent`] over a shared provider
pub struct ReactAgentFactory {
    provider: Arc<dyn LlmProvider>,
    config: AgentConfig,
}

impl ReactAgentFactory {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self::with_config(provider, AgentConfig::default())
    }

    /// `config.generation.model` is overridden per agent
    pub const fn with_config(provider: Arc<dyn LlmProvider>, config: AgentConfig) -> Self {
        Self { provider, config }
    }
}

impl AgentFactory for ReactAgentFactory {
    fn create_agent(&self, model_id: &str, tools: ToolRegistry) -> Box<dyn ConversationRunner> {
        let mut config = self.config.clone();
        config.generation.model = model_id.to_string();
        Box::new(Agent::new(self.provider.clone(), Arc::new(tools), config))
    }
}
