//! OpenRouter chat completions, model listing and the streamed-response decoder.
//!
//! Streaming responses arrive as newline-delimited server-sent events:
//!
//! ```text
//! data: {"choices":[{"delta":{"content":"Hel"}}]}
//! data: {"choices":[{"delta":{"images":[{"image_url":{"url":"https://..."}}]}}]}
//! data: [DONE]
//! ```
mod client;
mod config;
mod session;
pub(crate) mod transport;
mod types;

pub use client::OpenRouterClient;
pub use config::OpenRouterConfig;
pub use session::{StreamSession, decode_stream};
pub use types::OpenRouterModel;
