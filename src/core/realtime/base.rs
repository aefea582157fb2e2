//! Base traits and types for realtime audio-generation providers.
//!
//! A realtime provider holds a persistent, session-based streaming protocol
//! on the upstream side. The bridge abstraction defined here collapses that
//! into two one-shot contracts:
//!
//! - [`BaseRealtime::generate_audio`] opens a session, sends one text turn and
//!   returns the concatenated audio once the provider signals turn completion.
//! - [`BaseRealtime::stream_audio`] does the same but yields each audio
//!   fragment as soon as it arrives.
//!
//! # Audio Format
//!
//! Providers return raw PCM 16-bit signed little-endian mono audio. The sample
//! rate is provider specific (24kHz for Gemini Live).

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while bridging a turn to a realtime provider.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// Connection to the provider failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Authentication failed or no credential is configured
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// WebSocket transport error
    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    /// Provider-side protocol error
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Session deadline elapsed
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

/// Result type for realtime operations.
pub type RealtimeResult<T> = Result<T, RealtimeError>;

/// Lazy, finite, non-restartable sequence of audio fragments in receipt order.
///
/// Dropping the stream tears down the upstream session.
pub type AudioStream = BoxStream<'static, RealtimeResult<Bytes>>;

// =============================================================================
// Configuration Types
// =============================================================================

/// Default deadline for one bridged exchange, in seconds.
pub const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 60;

/// Base configuration for realtime providers.
///
/// The configuration is static for the lifetime of the provider; every call
/// opens a fresh session from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// API key for authentication
    pub api_key: String,

    /// Model to use (e.g., "gemini-2.0-flash-exp")
    #[serde(default)]
    pub model: String,

    /// Prebuilt voice name for audio output
    #[serde(default)]
    pub voice: Option<String>,

    /// System instruction for single-shot calls
    #[serde(default)]
    pub instructions: Option<String>,

    /// System instruction for streaming calls; falls back to `instructions`
    #[serde(default)]
    pub stream_instructions: Option<String>,

    /// Override for the provider WebSocket endpoint
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Upper bound on one exchange (connect, send and every receive)
    #[serde(default = "default_session_timeout")]
    pub session_timeout: Duration,
}

fn default_session_timeout() -> Duration {
    Duration::from_secs(DEFAULT_SESSION_TIMEOUT_SECS)
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: String::new(),
            voice: None,
            instructions: None,
            stream_instructions: None,
            endpoint: None,
            session_timeout: default_session_timeout(),
        }
    }
}

// =============================================================================
// Base Trait
// =============================================================================

/// Base trait for realtime audio-generation providers.
///
/// Implementations hold only static configuration. Each call owns its own
/// session exclusively, so one provider instance can be shared read-only
/// across concurrent requests.
///
/// # Example
///
/// ```rust,ignore
/// use gemini_voice_proxy::core::realtime::{BaseRealtime, GeminiLive, RealtimeConfig};
/// use futures::StreamExt;
///
/// let bridge = GeminiLive::new(RealtimeConfig {
///     api_key: "AIza...".to_string(),
///     ..Default::default()
/// })?;
///
/// let audio = bridge.generate_audio("Salam").await?;
///
/// let mut chunks = bridge.stream_audio("Salam");
/// while let Some(chunk) = chunks.next().await {
///     let chunk = chunk?;
///     // forward chunk
/// }
/// ```
#[async_trait]
pub trait BaseRealtime: Send + Sync {
    /// Send `prompt` as one complete turn and return the concatenated audio.
    ///
    /// An empty result (the turn ended without audio) is not an error here.
    async fn generate_audio(&self, prompt: &str) -> RealtimeResult<Bytes>;

    /// Send `prompt` as one complete turn and yield audio fragments as they arrive.
    fn stream_audio(&self, prompt: &str) -> AudioStream;

    /// Get provider information.
    fn get_provider_info(&self) -> serde_json::Value;
}

/// Shared trait object for realtime providers.
pub type SharedRealtime = std::sync::Arc<dyn BaseRealtime>;
