//! Mock provider servers for integration tests
//!
//! - WebSocket (Gemini Live BidiGenerateContent)

// Not every test binary uses every helper
#![allow(dead_code)]

pub mod gemini_live_mock;

pub use gemini_live_mock::{GeminiLiveMock, MockAction};
