use std::path::PathBuf;

use super::utils::{env_parse, env_string};
use super::validation;
use super::{
    DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SERVICE_NAME, ServerConfig, TlsConfig,
};
use crate::core::realtime::{DEFAULT_SESSION_TIMEOUT_SECS, GEMINI_LIVE_URL};
use crate::core::realtime::gemini::{DEFAULT_GEMINI_MODEL, GeminiVoice};

/// Build a configuration from process environment variables and defaults.
///
/// Values from a `.env` file are visible here once `dotenvy` has loaded them
/// at startup. Blank variables are treated as unset.
pub(crate) fn load_from_env() -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let host = env_string("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = env_parse::<u16>("PORT")?.unwrap_or(DEFAULT_PORT);

    let tls = tls_from_env()?;

    let session_timeout_seconds = env_parse::<u64>("GEMINI_SESSION_TIMEOUT_SECONDS")?
        .unwrap_or(DEFAULT_SESSION_TIMEOUT_SECS);

    Ok(ServerConfig {
        host,
        port,
        tls,
        service_name: env_string("SERVICE_NAME")
            .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
        gemini_api_key: env_string("GEMINI_API_KEY"),
        gemini_model: env_string("GEMINI_MODEL")
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
        gemini_voice: env_string("GEMINI_VOICE")
            .unwrap_or_else(|| GeminiVoice::default().as_str().to_string()),
        gemini_system_instruction: env_string("GEMINI_SYSTEM_INSTRUCTION"),
        gemini_stream_instruction: env_string("GEMINI_STREAM_INSTRUCTION"),
        gemini_live_url: env_string("GEMINI_LIVE_URL")
            .unwrap_or_else(|| GEMINI_LIVE_URL.to_string()),
        session_timeout_seconds,
        cors_allowed_origins: env_string("CORS_ALLOWED_ORIGINS"),
    })
}

fn tls_from_env() -> Result<Option<TlsConfig>, String> {
    let cert = env_string("TLS_CERT_PATH").map(PathBuf::from);
    let key = env_string("TLS_KEY_PATH").map(PathBuf::from);
    validation::validate_tls_paths(cert, key)
}
