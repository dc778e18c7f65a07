use serde::{Deserialize, Serialize};

/// Model entry returned by `GET /models`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpenRouterModel {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub context_length: Option<u64>,
    /// Remaining fields (pricing, architecture, ...) as sent by the API.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModelList {
    #[serde(default)]
    pub data: Vec<OpenRouterModel>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletion {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionChoice {
    #[serde(default)]
    pub message: Option<CompletionMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_keeps_unknown_fields() {
        let value = serde_json::json!({
            "id": "openai/gpt-4o-mini",
            "name": "GPT-4o mini",
            "context_length": 128000,
            "pricing": {"prompt": "0.00000015"}
        });
        let model: OpenRouterModel = serde_json::from_value(value).expect("model");
        assert_eq!(model.id, "openai/gpt-4o-mini");
        assert_eq!(model.context_length, Some(128000));
        assert!(model.extra.contains_key("pricing"));
        assert_eq!(model.description, None);
    }
}
