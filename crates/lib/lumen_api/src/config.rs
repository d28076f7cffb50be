//! Relay server configuration.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Default model identifier on Workers AI.
pub const DEFAULT_MODEL_ID: &str = "@cf/meta/llama-3.2-11b-vision-instruct-fp8-fast";

/// Default cap on generated tokens.
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Default Workers AI REST base URL.
pub const DEFAULT_WORKERS_AI_BASE_URL: &str = "https://api.cloudflare.com/client/v4";

/// System directive used when the operator does not configure one.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful, friendly assistant. \
Answer clearly and concisely. Put any code in fenced code blocks tagged with its language.";

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read system prompt file {path}: {source}")]
    SystemPromptFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid MAX_TOKENS value: {0}")]
    MaxTokens(String),
}

/// Inference provider credentials and endpoint.
#[derive(Clone)]
pub struct ProviderConfig {
    /// REST base URL (`.../client/v4`).
    pub base_url: String,
    /// Cloudflare account id.
    pub account_id: String,
    /// API token with Workers AI access.
    pub api_token: String,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("account_id", &self.account_id)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

/// Configuration for the relay server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8787").
    pub bind_addr: String,
    /// Model identifier every chat request is sent to.
    pub model_id: String,
    /// Token cap sent with every chat request.
    pub max_tokens: u32,
    /// System directive prepended to every conversation. Opaque text.
    pub system_prompt: String,
    /// Directory served for every non-API path.
    pub assets_dir: PathBuf,
    /// Inference provider settings.
    pub provider: ProviderConfig,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                | Default                                   |
    /// |-------------------------|-------------------------------------------|
    /// | `BIND_ADDR`             | `127.0.0.1:8787`                          |
    /// | `MODEL_ID`              | [`DEFAULT_MODEL_ID`]                      |
    /// | `MAX_TOKENS`            | `2048`                                    |
    /// | `SYSTEM_PROMPT`         | [`DEFAULT_SYSTEM_PROMPT`]                 |
    /// | `SYSTEM_PROMPT_FILE`    | unset; file contents win over `SYSTEM_PROMPT` |
    /// | `ASSETS_DIR`            | `public`                                  |
    /// | `CLOUDFLARE_ACCOUNT_ID` | empty                                     |
    /// | `CLOUDFLARE_API_TOKEN`  | empty                                     |
    /// | `WORKERS_AI_BASE_URL`   | [`DEFAULT_WORKERS_AI_BASE_URL`]           |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let max_tokens = match lookup("MAX_TOKENS") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::MaxTokens(raw.clone()))?,
            None => DEFAULT_MAX_TOKENS,
        };

        let system_prompt = match lookup("SYSTEM_PROMPT_FILE") {
            Some(path) => load_system_prompt(Path::new(&path))?,
            None => var("SYSTEM_PROMPT", DEFAULT_SYSTEM_PROMPT),
        };

        Ok(Self {
            bind_addr: var("BIND_ADDR", "127.0.0.1:8787"),
            model_id: var("MODEL_ID", DEFAULT_MODEL_ID),
            max_tokens,
            system_prompt,
            assets_dir: PathBuf::from(var("ASSETS_DIR", "public")),
            provider: ProviderConfig {
                base_url: var("WORKERS_AI_BASE_URL", DEFAULT_WORKERS_AI_BASE_URL),
                account_id: var("CLOUDFLARE_ACCOUNT_ID", ""),
                api_token: var("CLOUDFLARE_API_TOKEN", ""),
            },
        })
    }
}

/// Read a system directive from a file, trimming trailing whitespace.
pub fn load_system_prompt(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path)
        .map(|s| s.trim_end().to_string())
        .map_err(|source| ConfigError::SystemPromptFile {
            path: path.to_path_buf(),
            source,
        })
}
