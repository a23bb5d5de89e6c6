//! LLM chat wrapper with billing tags.
//!
//! Thin layer over the model provider's Responses API: pick a model by
//! capability tier, assemble role messages, optionally enforce a JSON
//! schema, and stamp every request with a normalized billing tag so usage
//! aggregates by caller. The API key is resolved through the secret cache,
//! never from code.

pub mod client;
pub mod types;

pub use client::{ChatClient, ChatOutput, DEFAULT_BASE_URL};
pub use types::{normalize_tag, Intelligence, ResponseFormat};
