//! Upstream API integrations.
pub mod openrouter;
pub mod search;
