use std::time::Duration;

use tracing::debug;

use crate::errors::ClientError;
use crate::http::{build_client, read_json, send_checked};
use crate::model::ProviderId;

use super::{SearchResponse, WebSearch, collect_results, require_query};

const BRAVE_PROVIDER: &str = "brave";

/// Configuration for the Brave Search web API.
#[derive(Clone, Debug)]
pub struct BraveConfig {
    /// Sent as `X-Subscription-Token`.
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl BraveConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.search.brave.com".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Builds a config from `BRAVE_API_KEY`.
    pub fn from_env() -> Result<Self, ClientError> {
        let api_key = std::env::var("BRAVE_API_KEY").unwrap_or_default();
        if api_key.trim().is_empty() {
            return Err(ClientError::Config(
                "missing BRAVE_API_KEY for Brave search".into(),
            ));
        }
        Ok(Self::new(api_key))
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub(crate) fn search_url(&self) -> String {
        format!("{}/res/v1/web/search", self.base_url.trim_end_matches('/'))
    }
}

pub struct BraveSearchClient {
    client: reqwest::Client,
    config: BraveConfig,
}

impl BraveSearchClient {
    pub fn new(config: BraveConfig) -> Result<Self, ClientError> {
        if config.api_key.trim().is_empty() {
            return Err(ClientError::Config(
                "Brave api_key must not be empty".into(),
            ));
        }
        let client = build_client()?;
        Ok(Self { client, config })
    }
}

#[async_trait::async_trait]
impl WebSearch for BraveSearchClient {
    fn name(&self) -> &'static str {
        BRAVE_PROVIDER
    }

    async fn search(&self, query: &str) -> Result<SearchResponse, ClientError> {
        let provider = ProviderId::new(BRAVE_PROVIDER);
        let query = require_query(query)?;
        debug!(provider = %provider, "sending search");

        let request = self
            .client
            .get(self.config.search_url())
            .query(&[("q", query)])
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.config.api_key)
            .timeout(self.config.timeout);
        let response = send_checked(&provider, request).await?;
        let raw = read_json(&provider, response).await?;
        let results = collect_results(
            raw.get("web").and_then(|web| web.get("results")),
            "url",
            "description",
        );
        Ok(SearchResponse { results, raw })
    }
}
