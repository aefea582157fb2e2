//! HTTP request handlers
//!
//! - `api` - Liveness endpoint
//! - `chat` - Prompt to audio over the upstream session bridge

pub mod api;
pub mod chat;

pub use chat::chat_handler;
