//! Smoke-test client for a running proxy.
//!
//! Posts one prompt to `<url>/chat`, decodes the returned audio and writes it
//! to disk. Files ending in `.wav` get a WAV header (16-bit mono at the
//! Gemini Live output rate); anything else is written as raw PCM.

use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow, bail};
use base64::prelude::*;
use tracing::{debug, info};

use crate::core::realtime::GEMINI_LIVE_SAMPLE_RATE;
use crate::handlers::chat::AudioResponse;

pub const DEFAULT_SMOKE_URL: &str = "http://localhost:8080";
pub const DEFAULT_SMOKE_PROMPT: &str = "Salam, necəsən? Bu gün hava necədir?";
pub const DEFAULT_SMOKE_OUTPUT: &str = "response.pcm";

/// Options for one smoke run
#[derive(Debug, Clone)]
pub struct SmokeOptions {
    /// Base URL of the proxy
    pub url: String,
    pub prompt: String,
    pub output: PathBuf,
}

impl Default for SmokeOptions {
    fn default() -> Self {
        Self {
            url: DEFAULT_SMOKE_URL.to_string(),
            prompt: DEFAULT_SMOKE_PROMPT.to_string(),
            output: PathBuf::from(DEFAULT_SMOKE_OUTPUT),
        }
    }
}

/// Send the prompt and save the audio. Returns the number of PCM bytes received.
pub async fn run(options: &SmokeOptions) -> anyhow::Result<usize> {
    let endpoint = format!("{}/chat", options.url.trim_end_matches('/'));
    info!("Sending smoke request to {}", endpoint);

    let client = reqwest::Client::new();
    let response = client
        .post(&endpoint)
        .json(&serde_json::json!({ "prompt": options.prompt }))
        .send()
        .await
        .with_context(|| format!("Request to {endpoint} failed"))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("Request failed with status {status}: {body}");
    }

    let payload: AudioResponse = response
        .json()
        .await
        .context("Response did not contain an audio payload")?;

    let pcm = BASE64_STANDARD
        .decode(payload.audio.as_bytes())
        .map_err(|e| anyhow!("Audio field is not valid base64: {e}"))?;

    write_audio(&options.output, &pcm)?;
    debug!("Wrote {} bytes to {}", pcm.len(), options.output.display());

    Ok(pcm.len())
}

/// Write PCM to `path`, wrapping it in WAV when the extension asks for it.
pub fn write_audio(path: &Path, pcm: &[u8]) -> anyhow::Result<()> {
    let is_wav = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));

    if is_wav {
        write_wav(path, pcm)
    } else {
        std::fs::write(path, pcm).with_context(|| format!("Failed to write {}", path.display()))
    }
}

fn write_wav(path: &Path, pcm: &[u8]) -> anyhow::Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: GEMINI_LIVE_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file: {}", path.display()))?;

    // A trailing odd byte is not a full sample
    for sample in pcm.chunks_exact(2) {
        writer
            .write_sample(i16::from_le_bytes([sample[0], sample[1]]))
            .context("Failed to write sample to WAV")?;
    }

    writer.finalize().context("Failed to finalize WAV file")?;
    Ok(())
}
