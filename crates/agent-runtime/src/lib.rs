//! # agent-runtime
//!
//! Concrete integrations for the search agent.
//!
//! ## Providers
//!
//! - **Groq** (default): hosted LLM inference over the OpenAI-compatible API
//! - **Serper** (default): Google web search results for the `Search` tool
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::{GroqConfig, GroqProvider, SerperClient, SerperConfig};
//!
//! let provider = Arc::new(GroqProvider::from_config(GroqConfig::from_env()?)?);
//! let search = SerperClient::from_config(SerperConfig::from_env()?)?;
//! let invoker = AgentInvoker::new(Arc::new(ReactAgentFactory::new(provider)))
//!     .with_search(Arc::new(search));
//! let reply = invoker.invoke("llama-3.3-70b-versatile", "What's new in Rust?", true, "").await?;
//! ```

pub mod http;

#[cfg(feature = "groq")]
pub mod groq;

#[cfg(feature = "serper")]
pub mod serper;

#[cfg(feature = "groq")]
pub use groq::{GroqConfig, GroqProvider};

#[cfg(feature = "serper")]
pub use serper::{SerperClient, SerperConfig};

// Re-export core types for convenience
pub use agent_core::{
    AgentError, AgentInvoker, LlmProvider, Message, ReactAgentFactory, Result, Role, SearchProvider,
};
