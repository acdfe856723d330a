//! Agent Invocation
//!
//! One call in, one string out: build an agent for the requested model,
//! optionally hand it the web search tool, run it over the caller's messages,
//! and return the last thing the assistant said.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};
use crate::message::{Conversation, Message};
use crate::reasoning::AgentFactory;
use crate::retry::RetryPolicy;
use crate::search::{SearchProvider, WebSearchTool};
use crate::tool::ToolRegistry;

/// Returned when the agent finished without producing an assistant message
pub const NO_RESPONSE: &str = "No response generated";

/// User input: one utterance or an ordered list of them
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Query {
    Single(String),
    Many(Vec<String>),
}

impl Query {
    /// Utterances in order
    pub fn utterances(&self) -> &[String] {
        match self {
            Self::Single(text) => std::slice::from_ref(text),
            Self::Many(texts) => texts,
        }
    }

    /// No utterance with any non-whitespace content
    pub fn is_empty(&self) -> bool {
        self.utterances().iter().all(|u| u.trim().is_empty())
    }
}

impl From<&str> for Query {
    fn from(text: &str) -> Self {
        Self::Single(text.to_string())
    }
}

impl From<String> for Query {
    fn from(text: String) -> Self {
        Self::Single(text)
    }
}

impl From<Vec<String>> for Query {
    fn from(texts: Vec<String>) -> Self {
        Self::Many(texts)
    }
}

impl From<&[&str]> for Query {
    fn from(texts: &[&str]) -> Self {
        Self::Many(texts.iter().map(ToString::to_string).collect())
    }
}

/// Assemble the conversation: optional system prompt, then one user message per utterance
pub fn build_conversation(query: &Query, system_prompt: &str) -> Conversation {
    let mut conversation = if system_prompt.is_empty() {
        Conversation::new()
    } else {
        Conversation::with_system_prompt(system_prompt)
    };

    for utterance in query.utterances() {
        conversation.push(Message::user(utterance.as_str()));
    }

    conversation
}

/// Runs one agent per call over a shared factory and search backend
pub struct AgentInvoker {
    factory: Arc<dyn AgentFactory>,
    search: Option<Arc<dyn SearchProvider>>,
    retry: RetryPolicy,
}

impl AgentInvoker {
    pub fn new(factory: Arc<dyn AgentFactory>) -> Self {
        Self {
            factory,
            search: None,
            retry: RetryPolicy::default(),
        }
    }

    /// Backend used when a call allows web search
    #[must_use]
    pub fn with_search(mut self, search: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(search);
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Capability set for one call: the search tool or nothing
    fn build_tools(&self, allow_search: bool) -> Result<ToolRegistry> {
        let mut tools = ToolRegistry::new();

        if allow_search {
            let search = self.search.clone().ok_or_else(|| {
                AgentError::Config("web search requested but no search provider is configured".into())
            })?;
            tools.register(WebSearchTool::new(search));
        }

        Ok(tools)
    }

    /// Run an agent to completion and return its final reply.
    ///
    /// Returns [`NO_RESPONSE`] when the run produced no assistant message.
    /// Upstream failures come back as errors, after transient ones have been
    /// retried per the configured [`RetryPolicy`].
    pub async fn invoke(
        &self,
        model_id: &str,
        query: impl Into<Query>,
        allow_search: bool,
        system_prompt: &str,
    ) -> Result<String> {
        let query = query.into();
        let tools = self.build_tools(allow_search)?;

        tracing::debug!(
            model = %model_id,
            allow_search,
            tools = tools.len(),
            utterances = query.utterances().len(),
            "Invoking agent"
        );

        let agent = self.factory.create_agent(model_id, tools);
        let agent = agent.as_ref();
        let conversation = &build_conversation(&query, system_prompt);

        let result = self
            .retry
            .execute(move || agent.run(conversation.clone()))
            .await?;

        Ok(result
            .last_assistant_content()
            .unwrap_or(NO_RESPONSE)
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;
    use crate::reasoning::ConversationRunner;
    use crate::search::SEARCH_TOOL_NAME;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// What a stub runner should do with the conversation it is given
    #[derive(Clone)]
    enum Behavior {
        Append(Vec<Message>),
        Fail(fn() -> AgentError),
        FailTimes(u32, Vec<Message>),
    }

    #[derive(Default)]
    struct Capture {
        models: Vec<String>,
        tool_names: Vec<Vec<String>>,
        inputs: Vec<Vec<Message>>,
        runs: u32,
    }

    struct StubFactory {
        behavior: Behavior,
        capture: Arc<Mutex<Capture>>,
    }

    struct StubRunner {
        behavior: Behavior,
        capture: Arc<Mutex<Capture>>,
    }

    impl StubFactory {
        fn new(behavior: Behavior) -> (Arc<Self>, Arc<Mutex<Capture>>) {
            let capture = Arc::new(Mutex::new(Capture::default()));
            let factory = Arc::new(Self {
                behavior,
                capture: capture.clone(),
            });
            (factory, capture)
        }
    }

    impl AgentFactory for StubFactory {
        fn create_agent(&self, model_id: &str, tools: ToolRegistry) -> Box<dyn ConversationRunner> {
            let mut capture = self.capture.lock().unwrap();
            capture.models.push(model_id.to_string());
            capture
                .tool_names
                .push(tools.names().into_iter().map(String::from).collect());
            Box::new(StubRunner {
                behavior: self.behavior.clone(),
                capture: self.capture.clone(),
            })
        }
    }

    #[async_trait]
    impl ConversationRunner for StubRunner {
        async fn run(&self, conversation: Conversation) -> Result<Conversation> {
            let run = {
                let mut capture = self.capture.lock().unwrap();
                capture.inputs.push(conversation.messages().to_vec());
                capture.runs += 1;
                capture.runs
            };

            let mut messages = conversation.into_messages();
            match &self.behavior {
                Behavior::Append(extra) => messages.extend(extra.iter().cloned()),
                Behavior::Fail(make) => return Err(make()),
                Behavior::FailTimes(n, extra) => {
                    if run <= *n {
                        return Err(AgentError::ProviderUnavailable("503".into()));
                    }
                    messages.extend(extra.iter().cloned());
                }
            }
            Ok(Conversation::from(messages))
        }
    }

    struct NullSearch;

    #[async_trait]
    impl SearchProvider for NullSearch {
        async fn search(&self, _query: &str) -> Result<String> {
            Ok(String::new())
        }
    }

    fn invoker(factory: Arc<StubFactory>) -> AgentInvoker {
        AgentInvoker::new(factory)
            .with_search(Arc::new(NullSearch))
            .with_retry(RetryPolicy {
                max_attempts: 3,
                initial_backoff: Duration::from_millis(1),
                max_backoff: Duration::from_millis(1),
                multiplier: 1.0,
            })
    }

    #[test]
    fn test_query_blank_utterances_are_empty() {
        assert!(Query::Many(Vec::new()).is_empty());
        assert!(Query::from(&["", "  \n"][..]).is_empty());
        assert!(Query::from("   ").is_empty());
        assert!(!Query::from(&["", "hi"][..]).is_empty());
    }

    #[tokio::test]
    async fn test_returns_last_assistant_message() {
        let (factory, _) = StubFactory::new(Behavior::Append(vec![
            Message::assistant("A1"),
            Message::tool("search output", Some("c1".into())),
            Message::assistant("A2"),
            Message::user("interjection"),
            Message::assistant("A3"),
            Message::tool("trailing", None),
        ]));

        let reply = invoker(factory).invoke("m", "question", false, "").await.unwrap();
        assert_eq!(reply, "A3");
    }

    #[tokio::test]
    async fn test_sentinel_when_no_assistant_message() {
        let (factory, _) = StubFactory::new(Behavior::Append(vec![Message::tool("only tools", None)]));

        let reply = invoker(factory).invoke("m", "question", false, "").await.unwrap();
        assert_eq!(reply, NO_RESPONSE);
        assert_eq!(reply, "No response generated");
    }

    #[tokio::test]
    async fn test_plain_query_yields_text_or_sentinel() {
        let (factory, _) = StubFactory::new(Behavior::Append(vec![Message::assistant("Hello there")]));

        let reply = invoker(factory).invoke("m", "hi", false, "").await.unwrap();
        assert!(!reply.is_empty());
    }

    #[tokio::test]
    async fn test_search_flag_controls_capabilities() {
        let (factory, capture) = StubFactory::new(Behavior::Append(Vec::new()));
        let invoker = invoker(factory);

        invoker.invoke("m", "q", true, "").await.unwrap();
        invoker.invoke("m", "q", false, "").await.unwrap();

        let capture = capture.lock().unwrap();
        assert_eq!(capture.tool_names[0], vec![SEARCH_TOOL_NAME.to_string()]);
        assert!(capture.tool_names[1].is_empty());
    }

    #[tokio::test]
    async fn test_search_without_provider_is_config_error() {
        let (factory, capture) = StubFactory::new(Behavior::Append(Vec::new()));
        let invoker = AgentInvoker::new(factory);

        let err = invoker.invoke("m", "q", true, "").await.unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));
        assert!(capture.lock().unwrap().models.is_empty());
    }

    #[tokio::test]
    async fn test_sequence_query_becomes_ordered_user_messages() {
        let (factory, capture) = StubFactory::new(Behavior::Append(Vec::new()));

        let query = Query::from(vec!["a".to_string(), "b".to_string()]);
        invoker(factory).invoke("m", query, false, "Be brief.").await.unwrap();

        let capture = capture.lock().unwrap();
        let input = &capture.inputs[0];
        assert_eq!(input.len(), 3);
        assert_eq!(input[0].role, Role::System);
        assert_eq!(input[0].content, "Be brief.");
        assert_eq!((input[1].role, input[1].content.as_str()), (Role::User, "a"));
        assert_eq!((input[2].role, input[2].content.as_str()), (Role::User, "b"));
    }

    #[tokio::test]
    async fn test_empty_system_prompt_adds_no_system_message() {
        let (factory, capture) = StubFactory::new(Behavior::Append(Vec::new()));

        invoker(factory).invoke("m", "solo", false, "").await.unwrap();

        let capture = capture.lock().unwrap();
        assert!(capture.inputs[0].iter().all(|m| m.role != Role::System));
        assert_eq!(capture.inputs[0].len(), 1);
    }

    #[tokio::test]
    async fn test_model_id_reaches_factory() {
        let (factory, capture) = StubFactory::new(Behavior::Append(Vec::new()));

        invoker(factory)
            .invoke("openai/gpt-oss-120b", "q", false, "")
            .await
            .unwrap();

        assert_eq!(capture.lock().unwrap().models, vec!["openai/gpt-oss-120b"]);
    }

    #[tokio::test]
    async fn test_transient_failure_retried_with_same_input() {
        let (factory, capture) =
            StubFactory::new(Behavior::FailTimes(2, vec![Message::assistant("recovered")]));

        let reply = invoker(factory).invoke("m", "q", false, "sys").await.unwrap();

        assert_eq!(reply, "recovered");
        let capture = capture.lock().unwrap();
        assert_eq!(capture.runs, 3);
        assert!(capture.inputs.iter().all(|input| input.len() == 2));
        assert_eq!(capture.models.len(), 1);
    }

    #[tokio::test]
    async fn test_permanent_failure_not_retried_and_not_sentinel() {
        let (factory, capture) =
            StubFactory::new(Behavior::Fail(|| AgentError::Auth("invalid key".into())));

        let err = invoker(factory).invoke("m", "q", false, "").await.unwrap_err();

        assert!(matches!(err, AgentError::Auth(_)));
        assert_eq!(capture.lock().unwrap().runs, 1);
    }

    #[test]
    fn test_query_deserializes_string_or_list() {
        let single: Query = serde_json::from_str("\"hello\"").unwrap();
        let many: Query = serde_json::from_str("[\"a\", \"b\"]").unwrap();

        assert_eq!(single.utterances(), ["hello".to_string()]);
        assert_eq!(many.utterances().len(), 2);
    }

    #[test]
    fn test_build_conversation_single_string() {
        let conversation = build_conversation(&Query::from("hi"), "");
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.messages()[0].role, Role::User);
    }
}
