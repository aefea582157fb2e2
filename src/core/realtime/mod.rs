//! Realtime audio-generation provider module.
//!
//! This module provides the upstream session bridge: a one-shot adapter from
//! a single text prompt to the audio produced by a session-based, streaming
//! provider.
//!
//! # Supported Providers
//!
//! - **Gemini Live API** - Audio responses from Gemini over BidiGenerateContent
//!
//! # Architecture
//!
//! - `BaseRealtime` trait for provider abstraction, injected into the HTTP layer
//! - One fresh upstream session per call, never reused
//! - Accumulated (`generate_audio`) and streamed (`stream_audio`) contracts
//!   sharing the same session logic
//!
//! # Example
//!
//! ```rust,ignore
//! use gemini_voice_proxy::core::realtime::{BaseRealtime, GeminiLive, RealtimeConfig};
//!
//! let bridge = GeminiLive::new(RealtimeConfig {
//!     api_key: "AIza...".to_string(),
//!     ..Default::default()
//! })?;
//! let pcm = bridge.generate_audio("Hello").await?;
//! ```

mod base;
pub mod gemini;

pub use base::{
    AudioStream, BaseRealtime, DEFAULT_SESSION_TIMEOUT_SECS, RealtimeConfig, RealtimeError,
    RealtimeResult, SharedRealtime,
};
pub use gemini::{GEMINI_LIVE_SAMPLE_RATE, GEMINI_LIVE_URL, GeminiLive, GeminiVoice};
