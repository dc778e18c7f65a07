use std::time::Duration;

use crate::errors::ClientError;

pub(crate) const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub(crate) const DEFAULT_REFERER: &str = "https://umbraix.com";
pub(crate) const DEFAULT_TITLE: &str = "Umbraix AI";

/// Configuration for the OpenRouter client.
#[derive(Clone, Debug)]
pub struct OpenRouterConfig {
    /// API key used for bearer auth.
    pub api_key: String,
    /// Base URL including the `/api/v1` prefix.
    ///
    /// Useful for proxies or local test servers.
    pub base_url: String,
    /// Sent as `HTTP-Referer` for OpenRouter app attribution.
    pub referer: String,
    /// Sent as `X-Title` for OpenRouter app attribution.
    pub title: String,
    /// Default HTTP timeout for non-streaming requests.
    pub timeout: Duration,
}

impl OpenRouterConfig {
    /// Creates a config with default endpoint and attribution headers.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            title: DEFAULT_TITLE.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    /// Builds a config from `OPENROUTER_API_KEY`.
    pub fn from_env() -> Result<Self, ClientError> {
        let api_key = std::env::var("OPENROUTER_API_KEY").unwrap_or_default();
        if api_key.trim().is_empty() {
            return Err(ClientError::Config(
                "missing OPENROUTER_API_KEY for OpenRouter client".into(),
            ));
        }
        Ok(Self::new(api_key))
    }

    /// Overrides the API base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the `HTTP-Referer` and `X-Title` attribution headers.
    pub fn attribution(mut self, referer: impl Into<String>, title: impl Into<String>) -> Self {
        self.referer = referer.into();
        self.title = title.into();
        self
    }

    /// Overrides the default HTTP timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn models_url(&self) -> String {
        format!("{}/models", self.base_url.trim_end_matches('/'))
    }

    pub(crate) fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}
