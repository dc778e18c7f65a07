use std::time::Duration;

use tracing::debug;

use crate::errors::ClientError;
use crate::http::{build_client, read_json, send_checked};
use crate::model::ProviderId;

use super::{SearchResponse, WebSearch, collect_results, require_query};

const SERPAPI_PROVIDER: &str = "serpapi";

/// Configuration for SerpAPI.
#[derive(Clone, Debug)]
pub struct SerpApiConfig {
    pub api_key: String,
    pub base_url: String,
    /// Engine name passed through as `engine` (for example `google`, `bing`).
    pub engine: String,
    pub timeout: Duration,
}

impl SerpApiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://serpapi.com".to_string(),
            engine: "google".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Builds a config from `SERPAPI_API_KEY`.
    pub fn from_env() -> Result<Self, ClientError> {
        let api_key = std::env::var("SERPAPI_API_KEY").unwrap_or_default();
        if api_key.trim().is_empty() {
            return Err(ClientError::Config(
                "missing SERPAPI_API_KEY for SerpAPI client".into(),
            ));
        }
        Ok(Self::new(api_key))
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = engine.into();
        self
    }

    pub(crate) fn search_url(&self) -> String {
        format!("{}/search.json", self.base_url.trim_end_matches('/'))
    }
}

pub struct SerpApiClient {
    client: reqwest::Client,
    config: SerpApiConfig,
}

impl SerpApiClient {
    pub fn new(config: SerpApiConfig) -> Result<Self, ClientError> {
        if config.api_key.trim().is_empty() {
            return Err(ClientError::Config(
                "SerpAPI api_key must not be empty".into(),
            ));
        }
        let client = build_client()?;
        Ok(Self { client, config })
    }
}

#[async_trait::async_trait]
impl WebSearch for SerpApiClient {
    fn name(&self) -> &'static str {
        SERPAPI_PROVIDER
    }

    async fn search(&self, query: &str) -> Result<SearchResponse, ClientError> {
        let provider = ProviderId::new(SERPAPI_PROVIDER);
        let query = require_query(query)?;
        debug!(provider = %provider, engine = %self.config.engine, "sending search");

        let request = self
            .client
            .get(self.config.search_url())
            .query(&[
                ("api_key", self.config.api_key.as_str()),
                ("q", query),
                ("engine", self.config.engine.as_str()),
            ])
            .timeout(self.config.timeout);
        let response = send_checked(&provider, request).await?;
        let raw = read_json(&provider, response).await?;
        let results = collect_results(raw.get("organic_results"), "link", "snippet");
        Ok(SearchResponse { results, raw })
    }
}
