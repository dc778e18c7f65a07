//! Clients for OpenRouter chat completions and web search APIs.
//!
//! The interesting part is the streamed chat decoder: it turns a chunked
//! server-sent-events body into ordered fragments and a final transcript, and
//! honors a cooperative abort signal between reads.
//!
//! # Streaming a reply
//!
//! ```no_run
//! use umbraix_client::prelude::*;
//! use umbraix_client::vendors::openrouter::OpenRouterClient;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), ClientError> {
//! let client = OpenRouterClient::from_env()?;
//! let (abort, signal) = AbortHandle::new();
//!
//! let mut sink = FnSink::new(
//!     |fragment: Fragment| print!("{}", fragment.as_str()),
//!     |transcript: &str| println!("\n[{} chars]", transcript.len()),
//! );
//! let request = ChatRequest::new("openai/gpt-4o-mini").user_text("Say hello");
//! let outcome = client.stream_chat(&request, &signal, &mut sink).await?;
//!
//! # drop(abort);
//! assert!(!outcome.cancelled);
//! # Ok(())
//! # }
//! ```

/// Cooperative cancellation handle and signal.
pub mod abort;
/// Environment-driven configuration.
pub mod config;
/// Public error type.
pub mod errors;
/// Shared HTTP helpers.
pub mod http;
/// Provider ids and chat request types.
pub mod model;
/// Logging setup.
pub mod observability;
/// Common imports for typical usage.
pub mod prelude;
/// Shared-key quota tracking.
pub mod quota;
/// Fragment sink contract and stream results.
pub mod stream;
/// Vendor-specific integrations.
pub mod vendors;

pub use abort::{AbortHandle, AbortSignal};
pub use config::ClientConfig;
pub use errors::ClientError;
pub use model::{ChatMessage, ChatRequest, Modality, ProviderId, Role};
pub use quota::{FileQuota, InMemoryQuota, QuotaTracker, QuotaUsage, SHARED_KEY_DAILY_LIMIT};
pub use stream::{FnSink, Fragment, StreamOutcome, StreamSink};
