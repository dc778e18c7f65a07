use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::errors::ClientError;
use crate::http::{build_client, read_json, send_checked};
use crate::model::ProviderId;
use crate::quota::QuotaTracker;

use super::{SearchResponse, WebSearch, collect_results, require_query};

const GOOGLE_PROVIDER: &str = "google";

/// Which key a Google Custom Search call is billed to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GoogleKey {
    /// The user's own key; not rate limited by this client.
    Personal(String),
    /// The application's shared default key; every call is counted.
    Shared(String),
}

impl GoogleKey {
    fn as_str(&self) -> &str {
        match self {
            Self::Personal(key) | Self::Shared(key) => key,
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, Self::Shared(_))
    }
}

/// Configuration for Google Custom Search JSON API.
#[derive(Clone, Debug)]
pub struct GoogleConfig {
    pub key: GoogleKey,
    /// Programmable Search Engine id (`cx`).
    pub engine_id: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl GoogleConfig {
    pub fn new(key: GoogleKey, engine_id: impl Into<String>) -> Self {
        Self {
            key,
            engine_id: engine_id.into(),
            base_url: "https://www.googleapis.com".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Prefers `GOOGLE_API_KEY`/`GOOGLE_CSE_ID`, falling back to the shared
    /// `UMBRAIX_SHARED_GOOGLE_API_KEY`/`UMBRAIX_SHARED_GOOGLE_CSE_ID` pair.
    pub fn from_env() -> Result<Self, ClientError> {
        let var = |key: &str| {
            std::env::var(key)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        if let (Some(key), Some(cx)) = (var("GOOGLE_API_KEY"), var("GOOGLE_CSE_ID")) {
            return Ok(Self::new(GoogleKey::Personal(key), cx));
        }
        if let (Some(key), Some(cx)) = (
            var("UMBRAIX_SHARED_GOOGLE_API_KEY"),
            var("UMBRAIX_SHARED_GOOGLE_CSE_ID"),
        ) {
            return Ok(Self::new(GoogleKey::Shared(key), cx));
        }
        Err(ClientError::Config(
            "missing GOOGLE_API_KEY/GOOGLE_CSE_ID (or the shared default pair) for Google search"
                .into(),
        ))
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub(crate) fn search_url(&self) -> String {
        format!("{}/customsearch/v1", self.base_url.trim_end_matches('/'))
    }
}

/// Google Custom Search client.
///
/// Calls on a shared key go through the injected `QuotaTracker` first.
pub struct GoogleSearchClient {
    client: reqwest::Client,
    config: GoogleConfig,
    quota: Arc<dyn QuotaTracker>,
}

impl GoogleSearchClient {
    pub fn new(config: GoogleConfig, quota: Arc<dyn QuotaTracker>) -> Result<Self, ClientError> {
        if config.key.as_str().trim().is_empty() || config.engine_id.trim().is_empty() {
            return Err(ClientError::Config(
                "Google search needs both an API key and an engine id".into(),
            ));
        }
        let client = build_client()?;
        Ok(Self {
            client,
            config,
            quota,
        })
    }

    /// Searches, counting a shared-key call against `date`.
    pub async fn search_on(
        &self,
        query: &str,
        date: NaiveDate,
    ) -> Result<SearchResponse, ClientError> {
        let provider = ProviderId::new(GOOGLE_PROVIDER);
        let query = require_query(query)?;
        if self.config.key.is_shared() && !self.quota.check_and_increment(date).await? {
            let limit = self.quota.limit();
            warn!(provider = %provider, %date, limit, "shared Google key quota exceeded");
            return Err(ClientError::QuotaExceeded { limit });
        }
        debug!(provider = %provider, shared_key = self.config.key.is_shared(), "sending search");

        let request = self
            .client
            .get(self.config.search_url())
            .query(&[
                ("key", self.config.key.as_str()),
                ("cx", self.config.engine_id.as_str()),
                ("q", query),
            ])
            .timeout(self.config.timeout);
        let response = send_checked(&provider, request).await?;
        let raw = read_json(&provider, response).await?;
        let results = collect_results(raw.get("items"), "link", "snippet");
        Ok(SearchResponse { results, raw })
    }
}

#[async_trait::async_trait]
impl WebSearch for GoogleSearchClient {
    fn name(&self) -> &'static str {
        GOOGLE_PROVIDER
    }

    async fn search(&self, query: &str) -> Result<SearchResponse, ClientError> {
        self.search_on(query, chrono::Local::now().date_naive()).await
    }
}
