//! Gemini Live API module.
//!
//! This module bridges single text turns to Google's Gemini Live
//! (BidiGenerateContent) API and collects the spoken answer.
//!
//! # Features
//!
//! - Audio-only response modality
//! - Prebuilt voice selection
//! - Configurable system instruction
//! - Accumulated and streamed audio output
//! - Per-call deadline covering connect, setup, send and receive
//!
//! # Supported Voices
//!
//! Puck, Charon, Kore, Fenrir, Aoede, Leda, Orus, Zephyr
//!
//! # Audio Format
//!
//! Output audio is PCM 16-bit signed little-endian mono at 24kHz.

mod client;
mod config;
mod messages;
mod session;

pub use client::GeminiLive;
pub use config::{
    DEFAULT_GEMINI_MODEL, DEFAULT_STREAM_INSTRUCTION, DEFAULT_SYSTEM_INSTRUCTION,
    GEMINI_LIVE_SAMPLE_RATE, GEMINI_LIVE_URL, GeminiVoice, Modality, qualified_model_name,
};
pub use messages::{ClientMessage, Content, Part, ServerContent, ServerMessage};
