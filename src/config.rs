use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Default per-request timeout for completion calls in seconds
const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 60;

/// Default Perplexity model when only an API key is given
const DEFAULT_PERPLEXITY_MODEL: &str = "sonar-pro";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,

    /// Override for OpenAI-compatible endpoints (LocalAI, vLLM, etc.)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AzureConfig {
    pub api_key: String,
    pub resource_name: String,
    pub deployment: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub model: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub endpoint: String,
    pub model: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    pub api_key: String,
    pub model: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PerplexityConfig {
    pub api_key: String,
    #[serde(default = "default_perplexity_model")]
    pub model: String,
}

fn default_perplexity_model() -> String {
    DEFAULT_PERPLEXITY_MODEL.to_string()
}

/// Completion provider credentials. At most one provider is used per process;
/// selection order is fixed (see `completion::from_config`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AiConfig {
    /// Timeout for a single completion request in seconds
    #[serde(default = "default_completion_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai: Option<OpenAiConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure: Option<AzureConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic: Option<AnthropicConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ollama: Option<OllamaConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openrouter: Option<OpenRouterConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perplexity: Option<PerplexityConfig>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_COMPLETION_TIMEOUT_SECS,
            openai: None,
            azure: None,
            anthropic: None,
            ollama: None,
            openrouter: None,
            perplexity: None,
        }
    }
}

fn default_completion_timeout_secs() -> u64 {
    DEFAULT_COMPLETION_TIMEOUT_SECS
}

impl AiConfig {
    pub fn is_configured(&self) -> bool {
        self.openai.is_some()
            || self.azure.is_some()
            || self.anthropic.is_some()
            || self.ollama.is_some()
            || self.openrouter.is_some()
            || self.perplexity.is_some()
    }

    /// Overlay provider credentials from the environment. Environment always
    /// wins over the config file so deployments can keep secrets out of it.
    fn apply_env(&mut self) {
        if let (Ok(api_key), Ok(model)) =
            (std::env::var("OPENAI_API_KEY"), std::env::var("OPENAI_MODEL"))
        {
            self.openai = Some(OpenAiConfig {
                api_key,
                model,
                base_url: std::env::var("CUSTOM_OPENAI_BASE_URL").ok(),
            });
        }

        if let (Ok(api_key), Ok(resource_name), Ok(deployment)) = (
            std::env::var("AZURE_API_KEY"),
            std::env::var("AZURE_RESOURCE_NAME"),
            std::env::var("AZURE_MODEL"),
        ) {
            self.azure = Some(AzureConfig {
                api_key,
                resource_name,
                deployment,
            });
        }

        if let (Ok(api_key), Ok(model)) = (
            std::env::var("ANTHROPIC_API_KEY"),
            std::env::var("ANTHROPIC_MODEL"),
        ) {
            self.anthropic = Some(AnthropicConfig { api_key, model });
        }

        if let (Ok(endpoint), Ok(model)) = (
            std::env::var("OLLAMA_ENDPOINT_URL"),
            std::env::var("OLLAMA_MODEL"),
        ) {
            self.ollama = Some(OllamaConfig { endpoint, model });
        }

        if let (Ok(api_key), Ok(model)) = (
            std::env::var("OPENROUTER_API_KEY"),
            std::env::var("OPENROUTER_MODEL"),
        ) {
            self.openrouter = Some(OpenRouterConfig { api_key, model });
        }

        if let Ok(api_key) = std::env::var("PERPLEXITY_API_KEY") {
            self.perplexity = Some(PerplexityConfig {
                api_key,
                model: std::env::var("PERPLEXITY_MODEL")
                    .unwrap_or_else(|_| DEFAULT_PERPLEXITY_MODEL.to_string()),
            });
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Shared bearer token for the HTTP API. Auth is disabled when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            auth_token: None,
            ai: AiConfig::default(),
            base_path: String::new(),
        }
    }
}

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

impl Config {
    fn validate(&mut self) {
        if self.ai.timeout_secs == 0 {
            panic!("ai.timeout_secs must be greater than 0");
        }

        if self.listen_addr.is_empty() {
            self.listen_addr = default_listen_addr();
        }

        if let Some(token) = &self.auth_token {
            if token.trim().is_empty() {
                panic!("auth_token must not be blank; remove it to disable auth");
            }
        }
    }

    pub fn load_with(base_path: &str) -> Self {
        let path = Path::new(base_path);
        std::fs::create_dir_all(path).expect("failed to create data directory");

        let config_path = path.join("config.yaml");

        // create new if does not exist
        if !config_path.exists() {
            std::fs::write(
                &config_path,
                serde_yml::to_string(&Self::default()).unwrap(),
            )
            .expect("failed to write default config");
        }

        let config_str =
            std::fs::read_to_string(&config_path).expect("config file is not readable");
        let mut config: Self = serde_yml::from_str(&config_str).expect("config is malformed");

        config.base_path = base_path.to_string();

        config.validate();

        // resave in case config version needs an upgrade; env overlay happens
        // after this so secrets from the environment never land on disk
        if config_str != serde_yml::to_string(&config).unwrap() {
            config.save();
        }

        config.ai.apply_env();

        config
    }

    pub fn save(&self) {
        let config_path = PathBuf::from(&self.base_path).join("config.yaml");

        let config_str = serde_yml::to_string(&self).unwrap();
        std::fs::write(config_path, config_str).expect("failed to save config");
    }
}
