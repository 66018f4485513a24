use crate::completion::{join_url, CompletionProvider};
use crate::config::OllamaConfig;
use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};
use std::time::Duration;

/// Local-model adapter using Ollama's non-streaming generate endpoint.
pub struct Ollama {
    endpoint: String,
    model: String,
    timeout: Duration,
}

impl Ollama {
    pub fn new(cfg: &OllamaConfig, timeout: Duration) -> Self {
        Self {
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            timeout,
        }
    }
}

impl CompletionProvider for Ollama {
    fn complete(&self, prompt: &str) -> Result<String> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;

        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        });

        let resp: Value = client
            .post(join_url(&self.endpoint, "api/generate"))
            .json(&body)
            .send()
            .context("ollama request failed")?
            .error_for_status()
            .context("ollama returned an error status")?
            .json()?;

        resp.get("response")
            .and_then(|v| v.as_str())
            .map(str::to_owned)
            .ok_or_else(|| anyhow!("ollama response has no response field"))
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}
