//! # agent-core
//!
//! Core agent logic: provider-agnostic LLM abstraction, tool system with a
//! web search capability, and the invoker that turns one chat request into
//! one reply.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        AgentInvoker                          │
//! │  query + model + allow_search + system prompt ──► reply      │
//! │  ┌──────────────┐  ┌──────────────┐  ┌────────────────────┐  │
//! │  │ AgentFactory │──│ ToolRegistry │──│ LlmProvider        │  │
//! │  │ (ReAct loop) │  │ (0..1 Search)│  │ (Strategy)         │  │
//! │  └──────────────┘  └──────────────┘  └────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` and `SearchProvider` traits keep the concrete HTTP
//! integrations (Groq, Serper) in `agent-runtime`.

pub mod error;
pub mod invoke;
pub mod message;
pub mod provider;
pub mod reasoning;
pub mod retry;
pub mod search;
pub mod tool;

pub use error::{AgentError, ErrorClass, Result};
pub use invoke::{AgentInvoker, NO_RESPONSE, Query};
pub use message::{Conversation, Message, Role};
pub use provider::LlmProvider;
pub use reasoning::{Agent, AgentFactory, ConversationRunner, ReactAgentFactory};
pub use retry::RetryPolicy;
pub use search::{SearchProvider, WebSearchTool};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult, ToolSchema};
