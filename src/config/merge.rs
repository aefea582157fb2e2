use std::path::PathBuf;

use super::ServerConfig;
use super::env::load_from_env;
use super::utils::non_empty;
use super::validation;
use super::yaml::YamlConfig;

/// Merge environment configuration (base) with optional YAML overrides.
///
/// Every value present in the YAML document replaces the value taken from
/// the environment; absent YAML values leave the environment value in place.
pub(crate) fn merge_config(
    yaml: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let mut config = load_from_env()?;

    let Some(yaml) = yaml else {
        return Ok(config);
    };

    if let Some(server) = yaml.server {
        if let Some(host) = non_empty(server.host) {
            config.host = host;
        }
        if let Some(port) = server.port {
            config.port = port;
        }
        if let Some(service_name) = non_empty(server.service_name) {
            config.service_name = service_name;
        }
        if let Some(tls) = server.tls {
            if tls.enabled == Some(false) {
                config.tls = None;
            } else {
                let cert = non_empty(tls.cert_path)
                    .map(PathBuf::from)
                    .or_else(|| config.tls.as_ref().map(|t| t.cert_path.clone()));
                let key = non_empty(tls.key_path)
                    .map(PathBuf::from)
                    .or_else(|| config.tls.as_ref().map(|t| t.key_path.clone()));
                config.tls = validation::validate_tls_paths(cert, key)?;
            }
        }
    }

    if let Some(gemini) = yaml.gemini {
        if let Some(api_key) = non_empty(gemini.api_key) {
            config.gemini_api_key = Some(api_key);
        }
        if let Some(model) = non_empty(gemini.model) {
            config.gemini_model = model;
        }
        if let Some(voice) = non_empty(gemini.voice) {
            config.gemini_voice = voice;
        }
        if let Some(instruction) = non_empty(gemini.system_instruction) {
            config.gemini_system_instruction = Some(instruction);
        }
        if let Some(instruction) = non_empty(gemini.stream_instruction) {
            config.gemini_stream_instruction = Some(instruction);
        }
        if let Some(live_url) = non_empty(gemini.live_url) {
            config.gemini_live_url = live_url;
        }
        if let Some(timeout) = gemini.session_timeout_seconds {
            config.session_timeout_seconds = timeout;
        }
    }

    if let Some(security) = yaml.security
        && let Some(origins) = non_empty(security.cors_allowed_origins)
    {
        config.cors_allowed_origins = Some(origins);
    }

    Ok(config)
}
