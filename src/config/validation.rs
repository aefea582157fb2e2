use std::path::PathBuf;

use url::Url;

use super::TlsConfig;

/// Both TLS paths must be configured together.
pub(crate) fn validate_tls_paths(
    cert_path: Option<PathBuf>,
    key_path: Option<PathBuf>,
) -> Result<Option<TlsConfig>, String> {
    match (cert_path, key_path) {
        (Some(cert_path), Some(key_path)) => Ok(Some(TlsConfig {
            cert_path,
            key_path,
        })),
        (None, None) => Ok(None),
        (Some(_), None) => {
            Err("TLS_CERT_PATH is set but TLS_KEY_PATH is missing".to_string())
        }
        (None, Some(_)) => {
            Err("TLS_KEY_PATH is set but TLS_CERT_PATH is missing".to_string())
        }
    }
}

/// The session deadline must be positive.
pub(crate) fn validate_session_timeout(seconds: u64) -> Result<(), String> {
    if seconds == 0 {
        return Err("GEMINI_SESSION_TIMEOUT_SECONDS must be greater than zero".to_string());
    }
    Ok(())
}

/// The upstream endpoint must be a WebSocket URL.
pub(crate) fn validate_live_url(live_url: &str) -> Result<(), String> {
    let url = Url::parse(live_url)
        .map_err(|e| format!("GEMINI_LIVE_URL is not a valid URL ('{live_url}'): {e}"))?;

    if !matches!(url.scheme(), "ws" | "wss") {
        return Err(format!(
            "GEMINI_LIVE_URL must use ws:// or wss://, got {}://",
            url.scheme()
        ));
    }

    if url.query_pairs().any(|(name, _)| name == "key") {
        return Err(
            "GEMINI_LIVE_URL must not carry the API key; set GEMINI_API_KEY instead".to_string(),
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_tls_paths() {
        assert!(validate_tls_paths(None, None).unwrap().is_none());

        let tls = validate_tls_paths(Some("/c.pem".into()), Some("/k.pem".into()))
            .unwrap()
            .unwrap();
        assert_eq!(tls.cert_path, PathBuf::from("/c.pem"));
        assert_eq!(tls.key_path, PathBuf::from("/k.pem"));

        assert!(validate_tls_paths(Some("/c.pem".into()), None).is_err());
        assert!(validate_tls_paths(None, Some("/k.pem".into())).is_err());
    }

    #[test]
    fn test_validate_session_timeout() {
        assert!(validate_session_timeout(0).is_err());
        assert!(validate_session_timeout(1).is_ok());
    }

    #[test]
    fn test_validate_live_url() {
        assert!(validate_live_url("wss://example.com/live").is_ok());
        assert!(validate_live_url("ws://127.0.0.1:9000").is_ok());
        assert!(validate_live_url("https://example.com/live").is_err());
        assert!(validate_live_url("not a url").is_err());
        assert!(validate_live_url("wss://example.com/live?key=abc").is_err());
    }
}
