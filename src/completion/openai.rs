use crate::completion::{join_url, CompletionProvider};
use crate::config::{OpenAiConfig, OpenRouterConfig, PerplexityConfig};
use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};
use std::time::Duration;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const PERPLEXITY_BASE_URL: &str = "https://api.perplexity.ai";

/// Chat-completions adapter for OpenAI and the services speaking its dialect
/// (OpenRouter, Perplexity, self-hosted gateways via a custom base URL).
pub struct OpenAiCompatible {
    label: &'static str,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl OpenAiCompatible {
    pub fn openai(cfg: &OpenAiConfig, timeout: Duration) -> Self {
        Self {
            label: "openai",
            base_url: cfg
                .base_url
                .clone()
                .unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            timeout,
        }
    }

    pub fn openrouter(cfg: &OpenRouterConfig, timeout: Duration) -> Self {
        Self {
            label: "openrouter",
            base_url: OPENROUTER_BASE_URL.to_string(),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            timeout,
        }
    }

    pub fn perplexity(cfg: &PerplexityConfig, timeout: Duration) -> Self {
        Self {
            label: "perplexity",
            base_url: PERPLEXITY_BASE_URL.to_string(),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            timeout,
        }
    }
}

/// Pull the assistant text out of a chat-completions response body.
pub(crate) fn extract_chat_content(resp: &Value) -> Result<String> {
    resp.get("choices")
        .and_then(|v| v.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .map(str::to_owned)
        .ok_or_else(|| anyhow!("completion response has no message content"))
}

impl CompletionProvider for OpenAiCompatible {
    fn complete(&self, prompt: &str) -> Result<String> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;

        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let resp: Value = client
            .post(join_url(&self.base_url, "chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .with_context(|| format!("{} request failed", self.label))?
            .error_for_status()
            .with_context(|| format!("{} returned an error status", self.label))?
            .json()?;

        extract_chat_content(&resp)
    }

    fn name(&self) -> &'static str {
        self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_chat_content() {
        let resp = json!({
            "choices": [
                { "message": { "role": "assistant", "content": "[1, 2]" } }
            ]
        });
        assert_eq!(extract_chat_content(&resp).unwrap(), "[1, 2]");
    }

    #[test]
    fn test_extract_chat_content_missing() {
        assert!(extract_chat_content(&json!({})).is_err());
        assert!(extract_chat_content(&json!({ "choices": [] })).is_err());
        assert!(extract_chat_content(&json!({
            "choices": [{ "message": { "content": 7 } }]
        }))
        .is_err());
    }
}
