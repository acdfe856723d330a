//! Serper Search Client
//!
//! `SearchProvider` backed by the Serper Google Search API. Results are
//! flattened into a single line of text the model can read.

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    search::SearchProvider,
};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::http::{build_client, status_to_error, transport_error, NotFound};

const SERVICE: &str = "Serper";

/// Returned when a search yields nothing usable
pub const NO_RESULTS: &str = "No good Google Search Result was found";

/// Serper client configuration
#[derive(Clone)]
pub struct SerperConfig {
    /// API key (`SERPER_API_KEY`)
    pub api_key: String,

    /// API base URL
    pub base_url: String,

    /// Country code
    pub gl: String,

    /// Language code
    pub hl: String,

    /// Number of organic results to request and keep
    pub num_results: usize,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl std::fmt::Debug for SerperConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerperConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("gl", &self.gl)
            .field("hl", &self.hl)
            .field("num_results", &self.num_results)
            .finish_non_exhaustive()
    }
}

impl SerperConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://google.serper.dev";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: Self::DEFAULT_BASE_URL.into(),
            gl: "us".into(),
            hl: "en".into(),
            num_results: 10,
            timeout_secs: 30,
        }
    }

    /// Read `SERPER_API_KEY` (required) and `SERPER_BASE_URL` (optional) from the environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] over an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("SERPER_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AgentError::Config("SERPER_API_KEY is not set".into()))?;

        let mut config = Self::new(api_key);
        if let Some(base_url) = lookup("SERPER_BASE_URL") {
            config.base_url = base_url;
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    q: &'a str,
    gl: &'a str,
    hl: &'a str,
    num: usize,
}

/// Serper web search client
pub struct SerperClient {
    client: reqwest::Client,
    config: SerperConfig,
}

impl SerperClient {
    pub fn from_config(config: SerperConfig) -> Result<Self> {
        let client = build_client(Duration::from_secs(config.timeout_secs))?;
        Ok(Self { client, config })
    }

    /// Raw JSON results for a query
    pub async fn results(&self, query: &str) -> Result<Value> {
        let url = format!("{}/search", self.config.base_url.trim_end_matches('/'));
        let request = SearchRequest {
            q: query,
            gl: &self.config.gl,
            hl: &self.config.hl,
            num: self.config.num_results,
        };

        let response = self
            .client
            .post(url)
            .header("X-API-KEY", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_to_error(SERVICE, status, &body, NotFound::Endpoint));
        }

        response
            .json()
            .await
            .map_err(|e| AgentError::Parse(format!("{SERVICE}: {e}")))
    }
}

#[async_trait]
impl SearchProvider for SerperClient {
    async fn search(&self, query: &str) -> Result<String> {
        tracing::debug!(%query, "Serper search");
        let results = self.results(query).await?;
        Ok(snippets(&results, self.config.num_results).join(" "))
    }
}

/// Extract readable snippets from a Serper response.
///
/// A direct answer box wins outright; otherwise knowledge graph facts come
/// first, followed by organic result snippets and their attributes.
pub fn snippets(results: &Value, limit: usize) -> Vec<String> {
    if let Some(answer_box) = results.get("answerBox").filter(|v| is_present(v)) {
        if let Some(answer) = non_empty_str(answer_box, "answer") {
            return vec![answer.to_string()];
        }
        if let Some(snippet) = non_empty_str(answer_box, "snippet") {
            return vec![snippet.replace('\n', " ")];
        }
        if let Some(highlighted) = answer_box.get("snippetHighlighted").and_then(Value::as_array) {
            let parts: Vec<String> = highlighted
                .iter()
                .filter_map(|v| v.as_str().map(ToString::to_string))
                .collect();
            if !parts.is_empty() {
                return parts;
            }
        }
    }

    let mut out = Vec::new();

    if let Some(graph) = results.get("knowledgeGraph").filter(|v| is_present(v)) {
        let title = graph.get("title").and_then(Value::as_str).unwrap_or_default();
        if let Some(kind) = non_empty_str(graph, "type") {
            out.push(format!("{title}: {kind}."));
        }
        if let Some(description) = non_empty_str(graph, "description") {
            out.push(description.to_string());
        }
        for (attribute, value) in attributes(graph) {
            out.push(format!("{title} {attribute}: {value}."));
        }
    }

    let organic = results
        .get("organic")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for result in organic.iter().take(limit) {
        if let Some(snippet) = result.get("snippet").and_then(Value::as_str) {
            out.push(snippet.to_string());
        }
        for (attribute, value) in attributes(result) {
            out.push(format!("{attribute}: {value}."));
        }
    }

    if out.is_empty() {
        out.push(NO_RESULTS.to_string());
    }
    out
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

fn non_empty_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn attributes(value: &Value) -> Vec<(String, String)> {
    value
        .get("attributes")
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .map(|(k, v)| {
                    let v = v.as_str().map_or_else(|| v.to_string(), ToString::to_string);
                    (k.clone(), v)
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_answer_box_short_circuits() {
        let results = json!({
            "answerBox": {"answer": "1,000 km"},
            "organic": [{"snippet": "ignored"}]
        });
        assert_eq!(snippets(&results, 10), vec!["1,000 km"]);
    }

    #[test]
    fn test_answer_box_snippet_flattens_newlines() {
        let results = json!({"answerBox": {"snippet": "line one\nline two"}});
        assert_eq!(snippets(&results, 10), vec!["line one line two"]);
    }

    #[test]
    fn test_answer_box_highlighted() {
        let results = json!({"answerBox": {"snippetHighlighted": ["a", "b"]}});
        assert_eq!(snippets(&results, 10), vec!["a", "b"]);
    }

    #[test]
    fn test_knowledge_graph_then_organic() {
        let results = json!({
            "knowledgeGraph": {
                "title": "Rust",
                "type": "Programming language",
                "description": "A systems language.",
                "attributes": {"Designed by": "Graydon Hoare"}
            },
            "organic": [
                {"title": "rust-lang.org", "snippet": "Empowering everyone.", "attributes": {"Stars": "90k"}},
                {"title": "Wikipedia", "snippet": "Rust is multi-paradigm."}
            ]
        });

        assert_eq!(
            snippets(&results, 10),
            vec![
                "Rust: Programming language.",
                "A systems language.",
                "Rust Designed by: Graydon Hoare.",
                "Empowering everyone.",
                "Stars: 90k.",
                "Rust is multi-paradigm.",
            ]
        );
    }

    #[test]
    fn test_organic_limit() {
        let results = json!({
            "organic": [{"snippet": "1"}, {"snippet": "2"}, {"snippet": "3"}]
        });
        assert_eq!(snippets(&results, 2), vec!["1", "2"]);
    }

    #[test]
    fn test_nothing_found() {
        assert_eq!(snippets(&json!({}), 10), vec![NO_RESULTS]);
        assert_eq!(snippets(&json!({"answerBox": {}, "organic": []}), 10), vec![NO_RESULTS]);
    }

    #[test]
    fn test_config_requires_key() {
        assert!(matches!(SerperConfig::from_lookup(|_| None), Err(AgentError::Config(_))));
        let config = SerperConfig::from_lookup(|key| (key == "SERPER_API_KEY").then(|| "k".to_string())).unwrap();
        assert_eq!(config.base_url, SerperConfig::DEFAULT_BASE_URL);
    }

    #[test]
    fn test_config_defaults() {
        let config = SerperConfig::new("serper_secret");
        assert_eq!(config.base_url, "https://google.serper.dev");
        assert_eq!(config.num_results, 10);
        assert!(!format!("{config:?}").contains("serper_secret"));
    }
}
