//! Gemini Live API configuration types.
//!
//! This module contains configuration types for the Gemini Live
//! (BidiGenerateContent) API:
//! - Endpoint and audio constants
//! - Prebuilt voice selection
//! - Response modalities
//! - Default system instructions

use serde::Serialize;

/// Gemini Live API WebSocket endpoint.
pub const GEMINI_LIVE_URL: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1alpha.GenerativeService.BidiGenerateContent";

/// Output sample rate of Gemini Live audio (PCM 16-bit mono).
pub const GEMINI_LIVE_SAMPLE_RATE: u32 = 24000;

/// Default Live model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";

/// System instruction used for single-shot generation.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are a helpful assistant. You confirm receiving the message and reply in Azerbaijani. Speak naturally.";

/// System instruction used for streamed generation.
pub const DEFAULT_STREAM_INSTRUCTION: &str =
    "You are a helpful assistant. Reply in Azerbaijani. Keep it relatively short and conversational.";

// =============================================================================
// Voices
// =============================================================================

/// Prebuilt voices available on the Gemini Live API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeminiVoice {
    Puck,
    Charon,
    Kore,
    Fenrir,
    /// Aoede voice (default)
    #[default]
    Aoede,
    Leda,
    Orus,
    Zephyr,
}

impl GeminiVoice {
    /// Convert to the API parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Puck => "Puck",
            Self::Charon => "Charon",
            Self::Kore => "Kore",
            Self::Fenrir => "Fenrir",
            Self::Aoede => "Aoede",
            Self::Leda => "Leda",
            Self::Orus => "Orus",
            Self::Zephyr => "Zephyr",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|voice| voice.as_str().eq_ignore_ascii_case(s.trim()))
    }

    /// Parse from string, with fallback to default.
    pub fn from_str_or_default(s: &str) -> Self {
        Self::parse(s).unwrap_or_else(|| {
            tracing::warn!("Unknown Gemini voice '{}', falling back to {}", s, Self::default());
            Self::default()
        })
    }

    /// Get all available voices.
    pub fn all() -> &'static [GeminiVoice] {
        &[
            Self::Puck,
            Self::Charon,
            Self::Kore,
            Self::Fenrir,
            Self::Aoede,
            Self::Leda,
            Self::Orus,
            Self::Zephyr,
        ]
    }
}

impl std::fmt::Display for GeminiVoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Modalities
// =============================================================================

/// Response modalities requested from the Gemini Live API.
///
/// The bridge only ever asks for audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    Audio,
}

/// Qualify a bare model name with the `models/` prefix the setup message expects.
pub fn qualified_model_name(model: &str) -> String {
    let model = if model.trim().is_empty() {
        DEFAULT_GEMINI_MODEL
    } else {
        model.trim()
    };

    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}
