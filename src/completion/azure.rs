use crate::completion::openai::extract_chat_content;
use crate::completion::CompletionProvider;
use crate::config::AzureConfig;
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::time::Duration;

const API_VERSION: &str = "2024-10-21";

/// Azure OpenAI speaks the chat-completions dialect but addresses deployments
/// by resource name and authenticates with an `api-key` header.
pub struct AzureOpenAi {
    api_key: String,
    resource_name: String,
    deployment: String,
    timeout: Duration,
}

impl AzureOpenAi {
    pub fn new(cfg: &AzureConfig, timeout: Duration) -> Self {
        Self {
            api_key: cfg.api_key.clone(),
            resource_name: cfg.resource_name.clone(),
            deployment: cfg.deployment.clone(),
            timeout,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "https://{}.openai.azure.com/openai/deployments/{}/chat/completions?api-version={}",
            self.resource_name, self.deployment, API_VERSION
        )
    }
}

impl CompletionProvider for AzureOpenAi {
    fn complete(&self, prompt: &str) -> Result<String> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;

        let body = json!({
            "messages": [{ "role": "user", "content": prompt }],
        });

        let resp: Value = client
            .post(self.endpoint())
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .context("azure request failed")?
            .error_for_status()
            .context("azure returned an error status")?
            .json()?;

        extract_chat_content(&resp)
    }

    fn name(&self) -> &'static str {
        "azure"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_shape() {
        let provider = AzureOpenAi::new(
            &AzureConfig {
                api_key: "key".to_string(),
                resource_name: "acme".to_string(),
                deployment: "gpt-4o".to_string(),
            },
            Duration::from_secs(5),
        );

        assert_eq!(
            provider.endpoint(),
            format!(
                "https://acme.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version={API_VERSION}"
            )
        );
    }
}
