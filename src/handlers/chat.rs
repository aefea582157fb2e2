//! Chat endpoint: one text turn in, spoken audio out.
//!
//! `POST /chat` and `POST /chat/completions` share [`chat_handler`]. The
//! request text is taken from `prompt` or, failing that, from the last entry
//! of `messages`. With `"stream": true` the audio is returned as
//! newline-delimited JSON, one line per upstream fragment.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json,
    body::{Body, Bytes},
    extract::{State, rejection::JsonRejection},
    http::header,
    response::{IntoResponse, Response},
};
use base64::prelude::*;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::realtime::{AudioStream, RealtimeError, SharedRealtime};
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// Content type of streamed responses
pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Chat request body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChatRequest {
    pub prompt: Option<String>,
    pub messages: Option<Vec<ChatMessage>>,
    pub stream: Option<bool>,
}

/// One conversation message
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChatMessage {
    pub role: String,
    /// May be `null`, e.g. on assistant tool-call messages
    pub content: Option<String>,
}

/// Audio payload returned to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioResponse {
    /// Base64-encoded PCM
    pub audio: String,
    pub encoding: String,
    pub format: String,
}

impl AudioResponse {
    pub fn from_pcm(pcm: &[u8]) -> Self {
        Self {
            audio: BASE64_STANDARD.encode(pcm),
            encoding: "base64".to_string(),
            format: "pcm".to_string(),
        }
    }
}

/// Pick the text to send upstream.
///
/// A non-blank `prompt` wins. Otherwise the content of the last message is
/// used, whatever its role.
pub fn resolve_prompt(request: &ChatRequest) -> AppResult<String> {
    if let Some(prompt) = request.prompt.as_deref()
        && !prompt.trim().is_empty()
    {
        return Ok(prompt.to_string());
    }

    if let Some(content) = request
        .messages
        .as_ref()
        .and_then(|m| m.last())
        .and_then(|last| last.content.as_deref())
        && !content.trim().is_empty()
    {
        return Ok(content.to_string());
    }

    Err(AppError::InvalidRequest(
        "No prompt provided: expected a non-empty `prompt` or `messages`".to_string(),
    ))
}

/// Handle `POST /chat` and `POST /chat/completions`.
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(request) = payload?;
    let prompt = resolve_prompt(&request)?;
    let stream = request.stream.unwrap_or(false);

    let bridge = state
        .bridge()
        .map_err(|e| AppError::Configuration(e.to_string()))?
        .clone();

    info!(
        prompt_chars = prompt.chars().count(),
        stream, "Processing chat request"
    );

    if stream {
        stream_response(bridge, &prompt).await
    } else {
        single_response(bridge, &prompt).await
    }
}

async fn single_response(bridge: SharedRealtime, prompt: &str) -> AppResult<Response> {
    let audio = bridge.generate_audio(prompt).await?;

    if audio.is_empty() {
        return Err(AppError::UpstreamEmptyResponse);
    }

    debug!("Returning {} bytes of audio", audio.len());
    Ok(Json(AudioResponse::from_pcm(&audio)).into_response())
}

async fn stream_response(bridge: SharedRealtime, prompt: &str) -> AppResult<Response> {
    let mut audio = bridge.stream_audio(prompt);

    // The status line is only committed once audio is flowing.
    let first = next_audio_chunk(&mut audio)
        .await
        .ok_or(AppError::UpstreamEmptyResponse)??;

    let body = async_stream::stream! {
        yield Ok::<_, Infallible>(audio_line(&first));

        while let Some(item) = next_audio_chunk(&mut audio).await {
            match item {
                Ok(chunk) => yield Ok(audio_line(&chunk)),
                Err(e) => {
                    let err = AppError::from(e);
                    warn!(code = err.code(), "Audio stream failed after first chunk: {}", err);
                    yield Ok(json_line(&serde_json::json!(err.body())));
                    break;
                }
            }
        }
    };

    Ok((
        [(header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)],
        Body::from_stream(body),
    )
        .into_response())
}

/// Next non-empty chunk from the bridge.
async fn next_audio_chunk(audio: &mut AudioStream) -> Option<Result<Bytes, RealtimeError>> {
    loop {
        match audio.next().await? {
            Ok(chunk) if chunk.is_empty() => continue,
            other => return Some(other),
        }
    }
}

fn audio_line(chunk: &[u8]) -> Bytes {
    json_line(&serde_json::json!(AudioResponse::from_pcm(chunk)))
}

fn json_line(value: &serde_json::Value) -> Bytes {
    Bytes::from(format!("{value}\n"))
}
