use std::pin::Pin;

use tracing::{debug, warn};

use crate::abort::AbortSignal;
use crate::errors::ClientError;
use crate::http::{build_client, read_json, send_checked};
use crate::model::{ChatRequest, ProviderId};
use crate::stream::{StreamOutcome, StreamSink};

use super::config::OpenRouterConfig;
use super::session::decode_stream;
use super::types::{ChatCompletion, ModelList, OpenRouterModel};

pub(crate) const OPENROUTER_PROVIDER: &str = "openrouter";

type ByteStream =
    Pin<Box<dyn futures::Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static>>;

/// Client for OpenRouter's model listing and chat completion endpoints.
pub struct OpenRouterClient {
    client: reqwest::Client,
    config: OpenRouterConfig,
}

impl OpenRouterClient {
    /// Creates a client from explicit configuration.
    ///
    /// An empty API key is accepted here; chat calls reject it and
    /// `list_models` returns an empty list.
    pub fn new(config: OpenRouterConfig) -> Result<Self, ClientError> {
        let client = build_client()?;
        Ok(Self { client, config })
    }

    /// Creates a client using `OPENROUTER_API_KEY`.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(OpenRouterConfig::from_env()?)
    }

    pub fn config(&self) -> &OpenRouterConfig {
        &self.config
    }

    /// Lists the models available to this key.
    pub async fn list_models(&self) -> Result<Vec<OpenRouterModel>, ClientError> {
        let provider = provider_id();
        if self.config.api_key.trim().is_empty() {
            warn!(provider = %provider, "OpenRouter API key is not set; skipping model fetch");
            return Ok(Vec::new());
        }
        let request = self
            .client
            .get(self.config.models_url())
            .bearer_auth(&self.config.api_key)
            .timeout(self.config.timeout);
        let response = send_checked(&provider, request).await?;
        let value = read_json(&provider, response).await?;
        let list: ModelList = serde_json::from_value(value).map_err(|e| {
            ClientError::protocol(provider.clone(), format!("unexpected model list shape: {e}"))
        })?;
        debug!(provider = %provider, models = list.data.len() as u64, "fetched model list");
        Ok(list.data)
    }

    /// Sends a non-streaming chat completion and returns the reply text.
    pub async fn chat(&self, request: &ChatRequest) -> Result<String, ClientError> {
        let provider = provider_id();
        let body = build_chat_body(request, false)?;
        self.require_key()?;
        debug!(provider = %provider, model = %request.model, messages = request.messages.len() as u64, "sending chat completion");

        let http_req = self.chat_request(&body).timeout(self.config.timeout);
        let response = send_checked(&provider, http_req).await?;
        let value = read_json(&provider, response).await?;
        let completion: ChatCompletion = serde_json::from_value(value).map_err(|_| invalid_format())?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(invalid_format)
    }

    /// Sends a streaming chat completion and decodes it into `sink`.
    ///
    /// Fails before any callback when the upstream rejects the request. See
    /// [`decode_stream`] for the abort and error contract once streaming has
    /// started.
    pub async fn stream_chat<K>(
        &self,
        request: &ChatRequest,
        signal: &AbortSignal,
        sink: &mut K,
    ) -> Result<StreamOutcome, ClientError>
    where
        K: StreamSink + ?Sized,
    {
        let provider = provider_id();
        let body = build_chat_body(request, true)?;
        self.require_key()?;
        debug!(provider = %provider, model = %request.model, modalities = ?request.modalities, "starting OpenRouter chat stream");

        let response = send_checked(&provider, self.chat_request(&body)).await?;
        let body_stream: ByteStream = Box::pin(response.bytes_stream());
        decode_stream(provider, body_stream, signal, sink).await
    }

    fn chat_request(&self, body: &serde_json::Value) -> reqwest::RequestBuilder {
        self.client
            .post(self.config.chat_url())
            .bearer_auth(&self.config.api_key)
            .header("HTTP-Referer", &self.config.referer)
            .header("X-Title", &self.config.title)
            .json(body)
    }

    fn require_key(&self) -> Result<(), ClientError> {
        if self.config.api_key.trim().is_empty() {
            return Err(ClientError::Config(
                "OpenRouter API key must not be empty".into(),
            ));
        }
        Ok(())
    }
}

fn provider_id() -> ProviderId {
    ProviderId::new(OPENROUTER_PROVIDER)
}

fn invalid_format() -> ClientError {
    ClientError::protocol(provider_id(), "Invalid response format from OpenRouter API")
}

pub(crate) fn build_chat_body(
    request: &ChatRequest,
    stream: bool,
) -> Result<serde_json::Value, ClientError> {
    if request.model.trim().is_empty() {
        return Err(ClientError::Validation("model must not be empty".into()));
    }
    if request.messages.is_empty() {
        return Err(ClientError::Validation(
            "at least one message is required".into(),
        ));
    }

    let mut body = serde_json::json!({
        "model": request.model,
        "messages": request.messages,
    });
    if stream {
        body["stream"] = serde_json::Value::Bool(true);
    }
    if !request.modalities.is_empty() {
        body["modalities"] = serde_json::json!(request.modalities);
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChatMessage, Modality};

    #[test]
    fn streaming_body_sets_stream_flag_and_modalities() {
        let request = ChatRequest::new("google/gemini-2.5-flash-image-preview")
            .user_text("draw a cat")
            .modalities([Modality::Image, Modality::Text]);
        let body = build_chat_body(&request, true).expect("body");
        assert_eq!(body.get("stream").and_then(|v| v.as_bool()), Some(true));
        assert_eq!(body["modalities"], serde_json::json!(["image", "text"]));
        assert_eq!(
            body["messages"],
            serde_json::json!([{"role": "user", "content": "draw a cat"}])
        );
    }

    #[test]
    fn plain_body_omits_stream_and_modalities() {
        let request = ChatRequest::new("m").message(ChatMessage::user("hi"));
        let body = build_chat_body(&request, false).expect("body");
        assert!(body.get("stream").is_none());
        assert!(body.get("modalities").is_none());
        assert_eq!(body.get("model").and_then(|v| v.as_str()), Some("m"));
    }

    #[test]
    fn body_validation_rejects_empty_model_and_messages() {
        assert!(matches!(
            build_chat_body(&ChatRequest::new(" ").user_text("x"), true),
            Err(ClientError::Validation(msg)) if msg.contains("model")
        ));
        assert!(matches!(
            build_chat_body(&ChatRequest::new("m"), true),
            Err(ClientError::Validation(msg)) if msg.contains("message")
        ));
    }

    #[tokio::test]
    async fn empty_key_lists_no_models_without_a_request() {
        let client = OpenRouterClient::new(
            OpenRouterConfig::new("").base_url("http://127.0.0.1:9/api/v1"),
        )
        .expect("client");
        assert_eq!(client.list_models().await.expect("models"), Vec::new());
    }

    #[tokio::test]
    async fn empty_key_rejects_chat() {
        let client = OpenRouterClient::new(OpenRouterConfig::new("  ")).expect("client");
        let err = client
            .chat(&ChatRequest::new("m").user_text("hi"))
            .await
            .expect_err("should fail");
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[tokio::test]
    async fn env_gated_smoke_stream_if_key_present() {
        if std::env::var("OPENROUTER_API_KEY")
            .unwrap_or_default()
            .trim()
            .is_empty()
        {
            eprintln!("skipping OpenRouter smoke test (OPENROUTER_API_KEY missing)");
            return;
        }

        let client = OpenRouterClient::from_env().expect("client");
        let mut fragments = 0usize;
        let mut completed = 0usize;
        let mut sink = crate::stream::FnSink::new(|_| fragments += 1, |_: &str| completed += 1);
        let result = client
            .stream_chat(
                &ChatRequest::new("openai/gpt-4o-mini").user_text("Reply with: ok"),
                &AbortSignal::never(),
                &mut sink,
            )
            .await;
        drop(sink);

        assert!(result.is_ok(), "OpenRouter smoke failed: {result:?}");
        assert_eq!(completed, 1);
        assert!(fragments > 0);
    }
}
