//! Gemini Live API WebSocket message types.
//!
//! All messages are JSON objects with camelCase keys. The server may deliver
//! them in either Text or Binary WebSocket frames.
//!
//! # Protocol Overview
//!
//! Client messages (sent to server):
//! - setup - Model, generation config and system instruction; must be first
//! - clientContent - Conversation turns, optionally closing the user turn
//!
//! Server messages (received from server):
//! - setupComplete - Setup accepted
//! - serverContent - Model turn parts, `turnComplete`, `interrupted`
//! - goAway - Server will close the connection soon
//! - toolCall / toolCallCancellation - Not used by this bridge

use base64::prelude::*;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::config::Modality;
use crate::core::realtime::base::{RealtimeError, RealtimeResult};

// =============================================================================
// Shared Content
// =============================================================================

/// A content block: an optional role and an ordered list of parts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Text-only content with an optional role.
    pub fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part {
                text: Some(text.to_string()),
                inline_data: None,
            }],
        }
    }
}

/// A single part of a content block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<Blob>,
}

/// Inline binary payload, base64 encoded on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    #[serde(default)]
    pub mime_type: String,
    pub data: String,
}

impl Blob {
    /// Decode the base64 payload.
    pub fn decode(&self) -> RealtimeResult<Bytes> {
        BASE64_STANDARD
            .decode(self.data.as_bytes())
            .map(Bytes::from)
            .map_err(|e| {
                RealtimeError::ProviderError(format!("invalid inline data payload: {e}"))
            })
    }
}

// =============================================================================
// Client Messages
// =============================================================================

/// Messages sent from the bridge to the Gemini Live server.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientMessage {
    /// Session setup; must be the first message on the socket
    Setup(Setup),
    /// Conversation content for the current turn
    ClientContent(ClientContent),
}

/// Session setup payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Setup {
    /// Fully qualified model name (`models/...`)
    pub model: String,
    pub generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
}

/// Generation configuration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<Modality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<SpeechConfig>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    pub voice_config: VoiceConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

/// Incremental conversation content.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientContent {
    pub turns: Vec<Content>,
    /// When true the server starts generating immediately
    pub turn_complete: bool,
}

impl ClientMessage {
    /// Build an audio-only setup message for the given model, voice and instruction.
    pub fn audio_setup(model: String, voice: &str, instruction: Option<&str>) -> Self {
        ClientMessage::Setup(Setup {
            model,
            generation_config: GenerationConfig {
                response_modalities: vec![Modality::Audio],
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: voice.to_string(),
                        },
                    },
                }),
            },
            system_instruction: instruction.map(|text| Content::text(None, text)),
        })
    }

    /// Build a single complete user turn.
    pub fn user_turn(text: &str) -> Self {
        ClientMessage::ClientContent(ClientContent {
            turns: vec![Content::text(Some("user"), text)],
            turn_complete: true,
        })
    }

    /// Serialize to the JSON text sent over the socket.
    pub fn to_json(&self) -> RealtimeResult<String> {
        serde_json::to_string(self).map_err(|e| RealtimeError::SerializationError(e.to_string()))
    }
}

// =============================================================================
// Server Messages
// =============================================================================

/// A message received from the Gemini Live server.
///
/// The server sends exactly one of the optional fields per message. Unknown
/// message kinds deserialize with every field unset.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    #[serde(default)]
    pub setup_complete: Option<serde_json::Value>,
    #[serde(default)]
    pub server_content: Option<ServerContent>,
    #[serde(default)]
    pub go_away: Option<GoAway>,
}

/// Model output for the current turn.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerContent {
    #[serde(default)]
    pub model_turn: Option<Content>,
    #[serde(default)]
    pub turn_complete: bool,
    #[serde(default)]
    pub interrupted: bool,
}

impl ServerContent {
    /// Decode every inline payload of the model turn, in part order.
    pub fn audio_fragments(&self) -> RealtimeResult<Vec<Bytes>> {
        let Some(turn) = &self.model_turn else {
            return Ok(Vec::new());
        };

        turn.parts
            .iter()
            .filter_map(|part| part.inline_data.as_ref())
            .map(Blob::decode)
            .collect()
    }
}

/// Notice that the server will disconnect soon.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoAway {
    #[serde(default)]
    pub time_left: Option<String>,
}

impl ServerMessage {
    /// Parse a server message from raw frame bytes.
    pub fn parse(raw: &[u8]) -> RealtimeResult<Self> {
        serde_json::from_slice(raw).map_err(|e| {
            RealtimeError::SerializationError(format!("invalid server message: {e}"))
        })
    }
}
