//! Environment-driven configuration for all clients.
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::quota::{FileQuota, InMemoryQuota, QuotaTracker, SHARED_KEY_DAILY_LIMIT};
use crate::vendors::openrouter::OpenRouterConfig;
use crate::vendors::search::{BraveConfig, GoogleConfig, SerpApiConfig};

/// Reads and parses an environment variable.
///
/// Unset or blank variables yield `None`; unparseable values are logged and
/// treated as unset.
pub fn get_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    parse_env_value(key, std::env::var(key).ok())
}

/// Parses a raw variable value the way [`get_env`] does.
pub fn parse_env_value<T: std::str::FromStr>(key: &str, raw: Option<String>) -> Option<T> {
    let raw = raw?;
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::error!("Error parsing {}", key);
            None
        }
    }
}

/// Per-provider configuration resolved from the environment.
///
/// Providers without credentials are `None`, except OpenRouter which keeps an
/// empty key so model listing can degrade to an empty list.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub openrouter: OpenRouterConfig,
    pub serpapi: Option<SerpApiConfig>,
    pub google: Option<GoogleConfig>,
    pub brave: Option<BraveConfig>,
    /// Where the shared-key quota counter is persisted; in memory when unset.
    pub quota_path: Option<PathBuf>,
}

impl ClientConfig {
    /// Resolves every provider from environment variables.
    ///
    /// - `OPENROUTER_API_KEY`
    /// - `SERPAPI_API_KEY`
    /// - `GOOGLE_API_KEY` + `GOOGLE_CSE_ID`, or `UMBRAIX_SHARED_GOOGLE_API_KEY` + `UMBRAIX_SHARED_GOOGLE_CSE_ID`
    /// - `BRAVE_API_KEY`
    /// - `UMBRAIX_HTTP_TIMEOUT_SECS`: request timeout applied to every provider.
    /// - `UMBRAIX_QUOTA_PATH`: JSON file for the shared-key counter.
    pub fn from_env() -> Self {
        let timeout = get_env::<u64>("UMBRAIX_HTTP_TIMEOUT_SECS").map(Duration::from_secs);

        let mut openrouter =
            OpenRouterConfig::new(get_env::<String>("OPENROUTER_API_KEY").unwrap_or_default());
        let mut serpapi = SerpApiConfig::from_env().ok();
        let mut google = GoogleConfig::from_env().ok();
        let mut brave = BraveConfig::from_env().ok();
        if let Some(timeout) = timeout {
            openrouter.timeout = timeout;
            if let Some(config) = serpapi.as_mut() {
                config.timeout = timeout;
            }
            if let Some(config) = google.as_mut() {
                config.timeout = timeout;
            }
            if let Some(config) = brave.as_mut() {
                config.timeout = timeout;
            }
        }

        Self {
            openrouter,
            serpapi,
            google,
            brave,
            quota_path: get_env::<PathBuf>("UMBRAIX_QUOTA_PATH"),
        }
    }

    /// Builds the quota tracker for the shared search key.
    pub fn quota_tracker(&self) -> Arc<dyn QuotaTracker> {
        match &self.quota_path {
            Some(path) => Arc::new(FileQuota::new(path.clone(), SHARED_KEY_DAILY_LIMIT)),
            None => Arc::new(InMemoryQuota::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_invalid_values_are_unset() {
        let value = |raw: &str| Some(raw.to_string());
        assert_eq!(parse_env_value::<String>("BLANK", value("   ")), None);
        assert_eq!(parse_env_value::<u64>("NUMBER", value(" 42 ")), Some(42));
        assert_eq!(parse_env_value::<u64>("BAD_NUMBER", value("forty-two")), None);
        assert_eq!(parse_env_value::<u64>("MISSING", None), None);
        assert_eq!(
            parse_env_value::<PathBuf>("PATH_LIKE", value(" /tmp/quota.json ")),
            Some(PathBuf::from("/tmp/quota.json"))
        );
    }

    #[test]
    fn quota_tracker_uses_the_shared_limit() {
        let config = ClientConfig {
            openrouter: OpenRouterConfig::new(""),
            serpapi: None,
            google: None,
            brave: None,
            quota_path: None,
        };
        assert_eq!(config.quota_tracker().limit(), SHARED_KEY_DAILY_LIMIT);
    }
}
