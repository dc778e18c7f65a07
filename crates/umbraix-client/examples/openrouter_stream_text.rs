use std::time::Duration;

use umbraix_client::prelude::*;
use umbraix_client::vendors::openrouter::OpenRouterClient;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ClientError> {
    umbraix_client::observability::init_observability();
    let client = OpenRouterClient::from_env()?;

    let (abort, signal) = AbortHandle::new();
    // Stop the reply after a few seconds; the partial transcript is still delivered.
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        abort.abort();
    });

    let mut sink = FnSink::new(
        |fragment: Fragment| match fragment {
            Fragment::Text(text) => print!("{text}"),
            Fragment::Image(url) => println!("\n[image] {url}"),
        },
        |transcript: &str| println!("\n-- {} chars", transcript.len()),
    );

    let request = ChatRequest::new("openai/gpt-4o-mini")
        .system_prompt("Reply to test OpenRouter streaming.")
        .user_text("Stream a greeting.");
    let outcome = client.stream_chat(&request, &signal, &mut sink).await?;
    if outcome.cancelled {
        eprintln!("stream stopped early");
    }
    Ok(())
}
