use pretty_assertions::assert_eq;
use serde_json::json;
use umbraix_client::prelude::*;
use umbraix_client::vendors::openrouter::{OpenRouterClient, OpenRouterConfig};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> OpenRouterClient {
    OpenRouterClient::new(
        OpenRouterConfig::new("test-key").base_url(format!("{}/api/v1", server.uri())),
    )
    .expect("client")
}

fn sse(lines: &[serde_json::Value]) -> String {
    let mut body = String::from(": OPENROUTER PROCESSING\n\n");
    for line in lines {
        body.push_str(&format!("data: {line}\n\n"));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

#[derive(Default)]
struct Collect {
    fragments: Vec<Fragment>,
    completions: Vec<String>,
}

impl StreamSink for Collect {
    fn on_fragment(&mut self, fragment: Fragment) {
        self.fragments.push(fragment);
    }

    fn on_complete(&mut self, transcript: &str) {
        self.completions.push(transcript.to_owned());
    }
}

#[tokio::test]
async fn stream_chat_delivers_text_and_images_in_order() {
    let server = MockServer::start().await;
    let body = sse(&[
        json!({"choices":[{"delta":{"role":"assistant","content":"A cat"}}]}),
        json!({"choices":[{"delta":{"images":[{"type":"image_url","image_url":{"url":"https://img.example/cat.png"}}]}}]}),
        json!({"choices":[{"delta":{"content":", as requested."},"finish_reason":"stop"}]}),
    ]);
    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(header("x-title", "Umbraix AI"))
        .and(header("http-referer", "https://umbraix.com"))
        .and(body_partial_json(json!({
            "model": "google/gemini-2.5-flash-image-preview",
            "stream": true,
            "modalities": ["image", "text"],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let request = ChatRequest::new("google/gemini-2.5-flash-image-preview")
        .user_text("draw a cat")
        .modalities([Modality::Image, Modality::Text]);
    let mut sink = Collect::default();
    let outcome = client_for(&server)
        .stream_chat(&request, &AbortSignal::never(), &mut sink)
        .await
        .expect("stream");

    assert_eq!(
        sink.fragments,
        vec![
            Fragment::Text("A cat".into()),
            Fragment::Image("https://img.example/cat.png".into()),
            Fragment::Text(", as requested.".into()),
        ]
    );
    assert_eq!(sink.completions, vec!["A cat, as requested.".to_string()]);
    assert_eq!(outcome.text, "A cat, as requested.");
    assert_eq!(outcome.images, vec!["https://img.example/cat.png".to_string()]);
    assert!(!outcome.cancelled);
}

#[tokio::test]
async fn stream_chat_surfaces_server_error_message_without_callbacks() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"error": {"message": "No auth credentials found", "code": 401}})),
        )
        .mount(&server)
        .await;

    let mut sink = Collect::default();
    let err = client_for(&server)
        .stream_chat(
            &ChatRequest::new("m").user_text("hi"),
            &AbortSignal::never(),
            &mut sink,
        )
        .await
        .expect_err("should fail");

    assert_eq!(err.status(), Some(401));
    assert_eq!(err.to_string(), "No auth credentials found");
    assert!(sink.fragments.is_empty());
    assert!(sink.completions.is_empty());
}

#[tokio::test]
async fn stream_chat_falls_back_to_status_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut sink = Collect::default();
    let err = client_for(&server)
        .stream_chat(
            &ChatRequest::new("m").user_text("hi"),
            &AbortSignal::never(),
            &mut sink,
        )
        .await
        .expect_err("should fail");
    assert_eq!(err.to_string(), "HTTP error! status: 503");
}

#[tokio::test]
async fn aborted_stream_completes_with_empty_transcript() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            sse(&[json!({"choices":[{"delta":{"content":"unseen"}}]})]),
            "text/event-stream",
        ))
        .mount(&server)
        .await;

    let (abort, signal) = AbortHandle::new();
    abort.abort();
    let mut sink = Collect::default();
    let outcome = client_for(&server)
        .stream_chat(&ChatRequest::new("m").user_text("hi"), &signal, &mut sink)
        .await
        .expect("stream");

    assert!(outcome.cancelled);
    assert!(sink.fragments.is_empty());
    assert_eq!(sink.completions, vec![String::new()]);
}

#[tokio::test]
async fn chat_returns_first_choice_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .and(body_partial_json(json!({"model": "m", "messages": [{"role": "user", "content": "hi"}]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "gen-1",
            "choices": [{"message": {"role": "assistant", "content": "hello there"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client_for(&server)
        .chat(&ChatRequest::new("m").user_text("hi"))
        .await
        .expect("chat");
    assert_eq!(reply, "hello there");
}

#[tokio::test]
async fn chat_rejects_response_without_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .chat(&ChatRequest::new("m").user_text("hi"))
        .await
        .expect_err("should fail");
    assert!(matches!(
        err,
        ClientError::Protocol { ref message, .. } if message == "Invalid response format from OpenRouter API"
    ));
}

#[tokio::test]
async fn list_models_reads_data_array() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/models"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "openai/gpt-4o-mini", "name": "GPT-4o mini", "context_length": 128000},
                {"id": "anthropic/claude-3.5-haiku"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let models = client_for(&server).list_models().await.expect("models");
    let ids: Vec<&str> = models.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["openai/gpt-4o-mini", "anthropic/claude-3.5-haiku"]);
    assert_eq!(models[0].name.as_deref(), Some("GPT-4o mini"));
}

#[tokio::test]
async fn list_models_returns_upstream_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/models"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .list_models()
        .await
        .expect_err("should fail");
    assert_eq!(err.status(), Some(502));
    assert_eq!(err.to_string(), "HTTP error! status: 502");
}
