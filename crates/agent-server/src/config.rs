//! Server Settings
//!
//! Read once at startup. Missing credentials fail here rather than on the
//! first request.

use agent_core::{provider::DEFAULT_MODEL, AgentError, Result};
use agent_runtime::{GroqConfig, SerperConfig};

/// Models a client may request unless `ALLOWED_MODEL_NAMES` says otherwise
pub const DEFAULT_ALLOWED_MODELS: &[&str] = &[DEFAULT_MODEL, "openai/gpt-oss-120b"];

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:9999";

#[derive(Debug, Clone)]
pub struct Settings {
    pub groq: GroqConfig,
    pub serper: SerperConfig,
    pub allowed_models: Vec<String>,
    pub bind_addr: String,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let groq = GroqConfig::from_lookup(&lookup)?;
        let serper = SerperConfig::from_lookup(&lookup)?;

        let allowed_models = match lookup("ALLOWED_MODEL_NAMES") {
            Some(raw) => parse_model_list(&raw)?,
            None => DEFAULT_ALLOWED_MODELS.iter().map(ToString::to_string).collect(),
        };

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());

        Ok(Self {
            groq,
            serper,
            allowed_models,
            bind_addr,
        })
    }
}

fn parse_model_list(raw: &str) -> Result<Vec<String>> {
    let models: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(ToString::to_string)
        .collect();

    if models.is_empty() {
        return Err(AgentError::Config("ALLOWED_MODEL_NAMES is empty".into()));
    }
    Ok(models)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings =
            Settings::from_lookup(lookup(&[("GROQ_API_KEY", "g"), ("SERPER_API_KEY", "s")])).unwrap();

        assert_eq!(settings.bind_addr, "127.0.0.1:9999");
        assert_eq!(settings.allowed_models, vec!["llama-3.3-70b-versatile", "openai/gpt-oss-120b"]);
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("GROQ_API_KEY", "g"),
            ("SERPER_API_KEY", "s"),
            ("ALLOWED_MODEL_NAMES", " qwen/qwen3-32b , llama-3.1-8b-instant,"),
            ("BIND_ADDR", "0.0.0.0:8080"),
        ]))
        .unwrap();

        assert_eq!(settings.allowed_models, vec!["qwen/qwen3-32b", "llama-3.1-8b-instant"]);
        assert_eq!(settings.bind_addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_missing_credentials_fail() {
        let err = Settings::from_lookup(lookup(&[("GROQ_API_KEY", "g")])).unwrap_err();
        assert!(matches!(err, AgentError::Config(ref msg) if msg.contains("SERPER_API_KEY")));

        let err = Settings::from_lookup(lookup(&[("SERPER_API_KEY", "s")])).unwrap_err();
        assert!(matches!(err, AgentError::Config(ref msg) if msg.contains("GROQ_API_KEY")));
    }

    #[test]
    fn test_blank_model_list_rejected() {
        let result = Settings::from_lookup(lookup(&[
            ("GROQ_API_KEY", "g"),
            ("SERPER_API_KEY", "s"),
            ("ALLOWED_MODEL_NAMES", " , "),
        ]));
        assert!(matches!(result, Err(AgentError::Config(_))));
    }
}
