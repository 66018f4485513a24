use crate::completion::CompletionProvider;
use crate::config::AnthropicConfig;
use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};
use std::time::Duration;

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Enough for a ranked id array over a 200-candidate corpus
const MAX_TOKENS: u32 = 1024;

pub struct Anthropic {
    api_key: String,
    model: String,
    timeout: Duration,
}

impl Anthropic {
    pub fn new(cfg: &AnthropicConfig, timeout: Duration) -> Self {
        Self {
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            timeout,
        }
    }
}

fn extract_text(resp: &Value) -> Result<String> {
    resp.get("content")
        .and_then(|v| v.as_array())
        .and_then(|blocks| {
            blocks
                .iter()
                .find(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
        })
        .and_then(|block| block.get("text"))
        .and_then(|text| text.as_str())
        .map(str::to_owned)
        .ok_or_else(|| anyhow!("anthropic response has no text block"))
}

impl CompletionProvider for Anthropic {
    fn complete(&self, prompt: &str) -> Result<String> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;

        let body = json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let resp: Value = client
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .context("anthropic request failed")?
            .error_for_status()
            .context("anthropic returned an error status")?
            .json()?;

        extract_text(&resp)
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}
