//! Configuration module for the voice proxy
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//! - `utils`: Utility functions for configuration parsing
//!
//! # Example
//! ```rust,no_run
//! use gemini_voice_proxy::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::core::realtime::RealtimeConfig;

mod env;
mod merge;
mod utils;
mod validation;
mod yaml;

pub use yaml::YamlConfig;

/// Default bind host
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default bind port
pub const DEFAULT_PORT: u16 = 8080;

/// Default service name reported by the liveness endpoint
pub const DEFAULT_SERVICE_NAME: &str = "ElevenLabs-Gemini-Proxy";

/// TLS configuration for HTTPS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Serve HTTPS when present
    pub tls: Option<TlsConfig>,

    /// Name reported by `GET /`
    pub service_name: String,

    /// Gemini API key; the bridge is disabled when absent
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_voice: String,
    pub gemini_system_instruction: Option<String>,
    pub gemini_stream_instruction: Option<String>,
    /// Gemini Live WebSocket endpoint, without credentials
    pub gemini_live_url: String,
    /// Deadline for one bridged exchange
    pub session_timeout_seconds: u64,

    /// Comma-separated allowed origins, or "*"; unset means "*"
    pub cors_allowed_origins: Option<String>,
}

/// Implement Drop to zeroize the API key when ServerConfig is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.gemini_api_key {
            key.zeroize();
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables and defaults
    ///
    /// The .env file is loaded into the environment by `main` before this is
    /// called. The resulting configuration is validated.
    ///
    /// # Errors
    /// Returns an error if an environment variable has an invalid format or
    /// validation fails. A missing `GEMINI_API_KEY` is not an error.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = merge::merge_config(None)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        validation::validate_session_timeout(self.session_timeout_seconds)?;
        validation::validate_live_url(&self.gemini_live_url)?;
        Ok(())
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// Session deadline as a duration
    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_seconds)
    }

    /// Build the bridge configuration
    ///
    /// # Errors
    /// Returns an error naming the missing variable when no API key is configured.
    pub fn realtime_config(&self) -> Result<RealtimeConfig, String> {
        let api_key = self
            .gemini_api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| "GEMINI_API_KEY is not configured".to_string())?;

        Ok(RealtimeConfig {
            api_key,
            model: self.gemini_model.clone(),
            voice: Some(self.gemini_voice.clone()),
            instructions: self.gemini_system_instruction.clone(),
            stream_instructions: self.gemini_stream_instruction.clone(),
            endpoint: Some(self.gemini_live_url.clone()),
            session_timeout: self.session_timeout(),
        })
    }
}
