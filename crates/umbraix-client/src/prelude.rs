//! Common imports for typical client usage.
pub use crate::vendors::search::{SearchResponse, SearchResult, WebSearch};
pub use crate::{
    AbortHandle, AbortSignal, ChatMessage, ChatRequest, ClientConfig, ClientError, FnSink,
    Fragment, Modality, StreamOutcome, StreamSink,
};
