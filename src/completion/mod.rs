//! Text-completion providers for the search pipeline.
//!
//! Every provider implements the same capability: send a prompt, get back the
//! raw completion text. Which provider backs the port is decided once at
//! startup from config; the pipeline itself never knows which one it talks to.

pub mod anthropic;
pub mod azure;
pub mod ollama;
pub mod openai;

use crate::config::AiConfig;
use std::time::Duration;

/// A provider that turns a prompt into a text completion. Implementations
/// make exactly one attempt; retries are the caller's decision (we make none).
pub trait CompletionProvider: Send + Sync {
    fn complete(&self, prompt: &str) -> anyhow::Result<String>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Select the configured provider, first match wins: OpenAI-compatible,
/// Azure, Anthropic, Ollama, OpenRouter, Perplexity. Returns None when no
/// credentials are present, which disables AI search.
pub fn from_config(cfg: &AiConfig) -> Option<Box<dyn CompletionProvider>> {
    let timeout = Duration::from_secs(cfg.timeout_secs);

    if let Some(c) = &cfg.openai {
        return Some(Box::new(openai::OpenAiCompatible::openai(c, timeout)));
    }
    if let Some(c) = &cfg.azure {
        return Some(Box::new(azure::AzureOpenAi::new(c, timeout)));
    }
    if let Some(c) = &cfg.anthropic {
        return Some(Box::new(anthropic::Anthropic::new(c, timeout)));
    }
    if let Some(c) = &cfg.ollama {
        return Some(Box::new(ollama::Ollama::new(c, timeout)));
    }
    if let Some(c) = &cfg.openrouter {
        return Some(Box::new(openai::OpenAiCompatible::openrouter(c, timeout)));
    }
    if let Some(c) = &cfg.perplexity {
        return Some(Box::new(openai::OpenAiCompatible::perplexity(c, timeout)));
    }

    None
}

/// Join a base URL and a path without doubling or dropping the slash.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
