//! Web search providers normalized to a common result shape.
mod brave;
mod google;
mod serpapi;

pub use brave::{BraveConfig, BraveSearchClient};
pub use google::{GoogleConfig, GoogleKey, GoogleSearchClient};
pub use serpapi::{SerpApiClient, SerpApiConfig};

use serde::{Deserialize, Serialize};

use crate::errors::ClientError;

/// One organic search hit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

/// Normalized hits plus the untouched provider payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub raw: serde_json::Value,
}

/// Common interface over the search providers.
#[async_trait::async_trait]
pub trait WebSearch: Send + Sync {
    /// Short provider name used in logs and errors.
    fn name(&self) -> &'static str;

    async fn search(&self, query: &str) -> Result<SearchResponse, ClientError>;
}

pub(crate) fn require_query(query: &str) -> Result<&str, ClientError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ClientError::Validation(
            "search query must not be empty".into(),
        ));
    }
    Ok(query)
}

/// Collects `{title, <link_key>, <snippet_key>}` objects from a JSON array.
pub(crate) fn collect_results(
    items: Option<&serde_json::Value>,
    link_key: &str,
    snippet_key: &str,
) -> Vec<SearchResult> {
    let field = |item: &serde_json::Value, key: &str| {
        item.get(key)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };
    items
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .map(|item| SearchResult {
                    title: field(item, "title"),
                    link: field(item, link_key),
                    snippet: field(item, snippet_key),
                })
                .filter(|result| !result.link.is_empty())
                .collect()
        })
        .unwrap_or_default()
}
