//! Gemini Live API client implementation.
//!
//! This module provides the Gemini Live client that implements the `BaseRealtime`
//! trait using Google's WebSocket-based BidiGenerateContent API.
//!
//! # API Reference
//!
//! - Endpoint: `wss://generativelanguage.googleapis.com/ws/...BidiGenerateContent?key=<key>`
//! - Protocol: WebSocket with JSON messages (text or binary frames)
//! - Audio: PCM 16-bit, 24kHz, mono, little-endian, base64 encoded
//!
//! # Example
//!
//! ```rust,ignore
//! use gemini_voice_proxy::core::realtime::{BaseRealtime, GeminiLive, RealtimeConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = RealtimeConfig {
//!         api_key: "AIza...".to_string(),
//!         voice: Some("Aoede".to_string()),
//!         ..Default::default()
//!     };
//!
//!     let gemini = GeminiLive::new(config).unwrap();
//!     let pcm = gemini.generate_audio("Salam, necəsən?").await.unwrap();
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::time::Instant;
use url::Url;

use super::config::{
    DEFAULT_STREAM_INSTRUCTION, DEFAULT_SYSTEM_INSTRUCTION, GEMINI_LIVE_SAMPLE_RATE,
    GEMINI_LIVE_URL, GeminiVoice, qualified_model_name,
};
use super::session::{LiveSession, SessionSetup};
use crate::core::realtime::base::{
    AudioStream, BaseRealtime, RealtimeConfig, RealtimeError, RealtimeResult,
};

// =============================================================================
// Gemini Live Client
// =============================================================================

/// Gemini Live API client implementation.
///
/// Holds only static configuration: every call opens its own session, sends a
/// single turn and closes the session again. The client is cheap to clone and
/// safe to share across concurrent requests.
#[derive(Clone)]
pub struct GeminiLive {
    inner: Arc<Inner>,
}

struct Inner {
    /// Fully qualified model name
    model: String,
    /// Parsed voice
    voice: GeminiVoice,
    /// Instruction for single-shot calls
    instruction: String,
    /// Instruction for streamed calls
    stream_instruction: String,
    /// Endpoint including the API key query parameter
    url: Url,
    /// Endpoint without credentials, safe to log
    log_url: String,
    session_timeout: std::time::Duration,
}

impl GeminiLive {
    /// Create a new client.
    ///
    /// Fails with [`RealtimeError::AuthenticationFailed`] when no API key is
    /// configured and with [`RealtimeError::InvalidConfiguration`] when the
    /// endpoint override is not a WebSocket URL.
    pub fn new(config: RealtimeConfig) -> RealtimeResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(RealtimeError::AuthenticationFailed(
                "API key is required".to_string(),
            ));
        }

        if config.session_timeout.is_zero() {
            return Err(RealtimeError::InvalidConfiguration(
                "session timeout must be greater than zero".to_string(),
            ));
        }

        let base = config.endpoint.as_deref().unwrap_or(GEMINI_LIVE_URL);
        let url = build_ws_url(base, &config.api_key)?;
        let log_url = format!(
            "{}://{}{}",
            url.scheme(),
            url.host_str().unwrap_or_default(),
            url.port().map(|p| format!(":{p}")).unwrap_or_default()
        );

        let voice = config
            .voice
            .as_deref()
            .map(GeminiVoice::from_str_or_default)
            .unwrap_or_default();

        let instruction = config
            .instructions
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_INSTRUCTION.to_string());
        let stream_instruction = config
            .stream_instructions
            .clone()
            .or_else(|| config.instructions.clone())
            .unwrap_or_else(|| DEFAULT_STREAM_INSTRUCTION.to_string());

        Ok(Self {
            inner: Arc::new(Inner {
                model: qualified_model_name(&config.model),
                voice,
                instruction,
                stream_instruction,
                url,
                log_url,
                session_timeout: config.session_timeout,
            }),
        })
    }

    /// Get the fully qualified model name.
    pub fn model(&self) -> &str {
        &self.inner.model
    }

    /// Get the configured voice.
    pub fn voice(&self) -> GeminiVoice {
        self.inner.voice
    }

    fn setup(&self, instruction: &str) -> SessionSetup {
        SessionSetup {
            model: self.inner.model.clone(),
            voice: self.inner.voice.as_str().to_string(),
            instruction: Some(instruction.to_string()),
        }
    }

    async fn open_session(&self, setup: &SessionSetup, prompt: &str) -> RealtimeResult<LiveSession> {
        let deadline = Instant::now() + self.inner.session_timeout;
        let mut session =
            LiveSession::open(self.inner.url.as_str(), &self.inner.log_url, setup, deadline)
                .await?;
        session.send_turn(prompt).await?;
        Ok(session)
    }

    async fn collect_audio(&self, prompt: &str) -> RealtimeResult<Bytes> {
        let setup = self.setup(&self.inner.instruction);
        let mut session = self.open_session(&setup, prompt).await?;

        let mut audio = BytesMut::new();
        let drained = async {
            while let Some(fragments) = session.next_fragments().await? {
                for fragment in fragments {
                    audio.extend_from_slice(&fragment);
                }
            }
            Ok::<(), RealtimeError>(())
        }
        .await;

        session.close().await;
        drained.map(|()| audio.freeze())
    }
}

/// Build the WebSocket URL with the API key query parameter.
fn build_ws_url(base: &str, api_key: &str) -> RealtimeResult<Url> {
    let mut url = Url::parse(base)
        .map_err(|e| RealtimeError::InvalidConfiguration(format!("invalid endpoint: {e}")))?;

    if !matches!(url.scheme(), "ws" | "wss") {
        return Err(RealtimeError::InvalidConfiguration(format!(
            "endpoint must use ws:// or wss://, got {}://",
            url.scheme()
        )));
    }

    url.query_pairs_mut().append_pair("key", api_key);
    Ok(url)
}

#[async_trait]
impl BaseRealtime for GeminiLive {
    async fn generate_audio(&self, prompt: &str) -> RealtimeResult<Bytes> {
        tracing::info!(
            model = %self.inner.model,
            voice = %self.inner.voice,
            prompt_chars = prompt.chars().count(),
            "Generating Gemini Live audio"
        );

        match self.collect_audio(prompt).await {
            Ok(audio) => {
                tracing::debug!("Gemini Live turn complete with {} audio bytes", audio.len());
                Ok(audio)
            }
            Err(e) => {
                tracing::error!("Error in Gemini Live generation: {}", e);
                Err(e)
            }
        }
    }

    fn stream_audio(&self, prompt: &str) -> AudioStream {
        tracing::info!(
            model = %self.inner.model,
            voice = %self.inner.voice,
            prompt_chars = prompt.chars().count(),
            "Streaming Gemini Live audio"
        );

        let client = self.clone();
        let prompt = prompt.to_string();

        Box::pin(async_stream::stream! {
            let setup = client.setup(&client.inner.stream_instruction);
            let mut session = match client.open_session(&setup, &prompt).await {
                Ok(session) => session,
                Err(e) => {
                    tracing::error!("Error in Gemini Live stream: {}", e);
                    yield Err(e);
                    return;
                }
            };

            loop {
                match session.next_fragments().await {
                    Ok(Some(fragments)) => {
                        for fragment in fragments {
                            yield Ok(fragment);
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::error!("Error in Gemini Live stream: {}", e);
                        yield Err(e);
                        break;
                    }
                }
            }

            session.close().await;
        })
    }

    fn get_provider_info(&self) -> serde_json::Value {
        serde_json::json!({
            "provider": "gemini",
            "api_type": "WebSocket Live (BidiGenerateContent)",
            "endpoint": self.inner.log_url,
            "model": self.inner.model,
            "voice": self.inner.voice.as_str(),
            "supported_voices": GeminiVoice::all().iter().map(|v| v.as_str()).collect::<Vec<_>>(),
            "response_modalities": ["AUDIO"],
            "output_format": "pcm16",
            "sample_rate": GEMINI_LIVE_SAMPLE_RATE,
            "session_timeout_secs": self.inner.session_timeout.as_secs(),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
