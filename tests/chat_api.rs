//! HTTP front door tests
//!
//! Exercise the router with `oneshot` requests against an injected bridge.

mod mock_providers;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::prelude::*;
use bytes::Bytes;
use futures::stream;
use serde_json::{Value, json};
use tower::util::ServiceExt;

use gemini_voice_proxy::{
    ServerConfig,
    core::realtime::{AudioStream, BaseRealtime, RealtimeError, RealtimeResult},
    routes,
    state::AppState,
};
use mock_providers::{GeminiLiveMock, MockAction};

/// Scripted bridge behaviour
#[derive(Clone)]
enum Reply {
    Audio(Vec<Vec<u8>>),
    Fail(fn() -> RealtimeError),
    /// Chunks, then an error
    AudioThenFail(Vec<Vec<u8>>, fn() -> RealtimeError),
}

struct FakeBridge {
    reply: Reply,
    prompts: Mutex<Vec<String>>,
}

impl FakeBridge {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseRealtime for FakeBridge {
    async fn generate_audio(&self, prompt: &str) -> RealtimeResult<Bytes> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Reply::Audio(chunks) => Ok(Bytes::from(chunks.concat())),
            Reply::Fail(err) | Reply::AudioThenFail(_, err) => Err(err()),
        }
    }

    fn stream_audio(&self, prompt: &str) -> AudioStream {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let items: Vec<RealtimeResult<Bytes>> = match &self.reply {
            Reply::Audio(chunks) => chunks.iter().cloned().map(|c| Ok(Bytes::from(c))).collect(),
            Reply::Fail(err) => vec![Err(err())],
            Reply::AudioThenFail(chunks, err) => chunks
                .iter()
                .cloned()
                .map(|c| Ok(Bytes::from(c)))
                .chain(std::iter::once(Err(err())))
                .collect(),
        };
        Box::pin(stream::iter(items))
    }

    fn get_provider_info(&self) -> Value {
        json!({"provider": "fake"})
    }
}

fn test_config(api_key: Option<&str>, live_url: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        tls: None,
        service_name: "ElevenLabs-Gemini-Proxy".to_string(),
        gemini_api_key: api_key.map(str::to_string),
        gemini_model: "gemini-2.0-flash-exp".to_string(),
        gemini_voice: "Aoede".to_string(),
        gemini_system_instruction: None,
        gemini_stream_instruction: None,
        gemini_live_url: live_url.to_string(),
        session_timeout_seconds: 5,
        cors_allowed_origins: None,
    }
}

fn app_with(bridge: Arc<FakeBridge>) -> Router {
    let state = AppState::with_bridge(test_config(Some("k"), "ws://127.0.0.1:1/live"), bridge);
    routes::create_app(state)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn read_lines(response: axum::response::Response) -> Vec<Value> {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec())
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let app = app_with(FakeBridge::new(Reply::Audio(vec![])));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
    assert_eq!(
        read_json(response).await,
        json!({"status": "ok", "service": "ElevenLabs-Gemini-Proxy"})
    );
}

#[tokio::test]
async fn test_chat_returns_base64_audio() {
    let pcm: Vec<u8> = (0..=255).collect();
    let bridge = FakeBridge::new(Reply::Audio(vec![pcm[..100].to_vec(), pcm[100..].to_vec()]));
    let app = app_with(bridge.clone());

    let response = app
        .oneshot(post_json("/chat", json!({"prompt": "Salam"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["encoding"], "base64");
    assert_eq!(body["format"], "pcm");
    let decoded = BASE64_STANDARD
        .decode(body["audio"].as_str().unwrap())
        .unwrap();
    assert_eq!(decoded, pcm);
    assert_eq!(bridge.prompts(), vec!["Salam"]);
}

#[tokio::test]
async fn test_prompt_wins_over_messages() {
    let bridge = FakeBridge::new(Reply::Audio(vec![vec![1]]));
    let app = app_with(bridge.clone());

    let response = app
        .oneshot(post_json(
            "/chat",
            json!({"prompt": "A", "messages": [{"role": "user", "content": "B"}]}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(bridge.prompts(), vec!["A"]);
}

#[tokio::test]
async fn test_last_message_used_regardless_of_role() {
    let bridge = FakeBridge::new(Reply::Audio(vec![vec![1]]));
    let app = app_with(bridge.clone());

    let response = app
        .oneshot(post_json(
            "/chat/completions",
            json!({"messages": [
                {"role": "user", "content": "X"},
                {"role": "assistant", "content": "Y"}
            ]}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(bridge.prompts(), vec!["Y"]);
}

#[tokio::test]
async fn test_empty_request_is_bad_request() {
    let bridge = FakeBridge::new(Reply::Audio(vec![vec![1]]));
    let app = app_with(bridge.clone());

    let response = app.oneshot(post_json("/chat", json!({}))).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["code"], "invalid_request");
    assert!(bridge.prompts().is_empty(), "bridge must not be invoked");
}

#[tokio::test]
async fn test_empty_audio_is_gateway_timeout() {
    let app = app_with(FakeBridge::new(Reply::Audio(vec![])));

    let response = app
        .oneshot(post_json("/chat", json!({"prompt": "Salam"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let body = read_json(response).await;
    assert!(body.get("audio").is_none());
    assert_eq!(body["code"], "upstream_empty_response");
}

#[tokio::test]
async fn test_bridge_error_mapping() {
    let cases: [(fn() -> RealtimeError, StatusCode, &str); 3] = [
        (
            || RealtimeError::ConnectionFailed("refused".into()),
            StatusCode::BAD_GATEWAY,
            "upstream_session_error",
        ),
        (
            || RealtimeError::ProviderError("closed (1011)".into()),
            StatusCode::BAD_GATEWAY,
            "upstream_session_error",
        ),
        (
            || RealtimeError::Timeout("waiting".into()),
            StatusCode::GATEWAY_TIMEOUT,
            "upstream_timeout",
        ),
    ];

    for (err, status, code) in cases {
        let app = app_with(FakeBridge::new(Reply::Fail(err)));
        let response = app
            .oneshot(post_json("/chat", json!({"prompt": "Salam"})))
            .await
            .unwrap();

        assert_eq!(response.status(), status);
        let body = read_json(response).await;
        assert_eq!(body["code"], code);
        assert!(!body["detail"].as_str().unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_missing_api_key_fails_chat_but_not_health() {
    let state = AppState::new(test_config(None, "ws://127.0.0.1:1/live"));
    let app = routes::create_app(state);

    let response = app
        .clone()
        .oneshot(post_json("/chat", json!({"prompt": "Salam"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json(response).await;
    assert_eq!(body["code"], "configuration_error");
    assert!(body["detail"].as_str().unwrap().contains("GEMINI_API_KEY"));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_stream_returns_ndjson_chunks() {
    let bridge = FakeBridge::new(Reply::Audio(vec![vec![1, 2], vec![], vec![3]]));
    let app = app_with(bridge.clone());

    let response = app
        .oneshot(post_json("/chat", json!({"prompt": "Salam", "stream": true})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/x-ndjson"
    );

    let lines = read_lines(response).await;
    assert_eq!(lines.len(), 2, "empty fragments are skipped");
    let audio: Vec<u8> = lines
        .iter()
        .flat_map(|line| {
            assert_eq!(line["encoding"], "base64");
            assert_eq!(line["format"], "pcm");
            BASE64_STANDARD
                .decode(line["audio"].as_str().unwrap())
                .unwrap()
        })
        .collect();
    assert_eq!(audio, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_stream_without_audio_is_gateway_timeout() {
    let app = app_with(FakeBridge::new(Reply::Audio(vec![])));

    let response = app
        .oneshot(post_json("/chat", json!({"prompt": "Salam", "stream": true})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(read_json(response).await["code"], "upstream_empty_response");
}

#[tokio::test]
async fn test_stream_error_before_audio_uses_status() {
    let app = app_with(FakeBridge::new(Reply::Fail(|| {
        RealtimeError::ConnectionFailed("refused".into())
    })));

    let response = app
        .oneshot(post_json("/chat", json!({"prompt": "Salam", "stream": true})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_stream_error_after_audio_ends_with_error_line() {
    let app = app_with(FakeBridge::new(Reply::AudioThenFail(vec![vec![7]], || {
        RealtimeError::Timeout("waiting".into())
    })));

    let response = app
        .oneshot(post_json("/chat", json!({"prompt": "Salam", "stream": true})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let lines = read_lines(response).await;
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["audio"], BASE64_STANDARD.encode([7u8]));
    assert_eq!(lines[1]["code"], "upstream_timeout");
    assert!(lines[1].get("audio").is_none());
}

#[tokio::test]
async fn test_chat_end_to_end_with_mock_gemini() {
    let mock = GeminiLiveMock::start(vec![
        MockAction::Audio(vec![vec![10, 20]]),
        MockAction::AudioWithTurnComplete(vec![30]),
    ])
    .await;
    let state = AppState::new(test_config(Some("test-key"), &mock.url));
    assert!(state.is_bridge_ready());
    let app = routes::create_app(state);

    let response = tokio::time::timeout(
        Duration::from_secs(10),
        app.oneshot(post_json(
            "/chat",
            json!({"messages": [{"role": "user", "content": "Salam"}]}),
        )),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(
        BASE64_STANDARD
            .decode(body["audio"].as_str().unwrap())
            .unwrap(),
        vec![10, 20, 30]
    );

    let sessions = mock.sessions();
    assert_eq!(sessions.len(), 1);
    assert_eq!(
        sessions[0].messages[1]["clientContent"]["turns"][0]["parts"][0]["text"],
        "Salam"
    );
}

#[tokio::test]
async fn test_cors_preflight_allows_any_origin_by_default() {
    let app = app_with(FakeBridge::new(Reply::Audio(vec![vec![1]])));

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/chat")
                .header(header::ORIGIN, "https://elevenlabs.io")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_malformed_body_gets_json_error() {
    let bridge = FakeBridge::new(Reply::Audio(vec![vec![1]]));

    for body in [
        Body::from(json!({"prompt": 5}).to_string()),
        Body::from("{not json"),
    ] {
        let request = Request::builder()
            .method("POST")
            .uri("/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .unwrap();

        let response = app_with(bridge.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let body = read_json(response).await;
        assert_eq!(body["code"], "invalid_request");
        assert!(!body["detail"].as_str().unwrap().is_empty());
    }

    assert!(bridge.prompts().is_empty());
}

#[tokio::test]
async fn test_null_message_content_is_accepted() {
    let bridge = FakeBridge::new(Reply::Audio(vec![vec![1]]));
    let app = app_with(bridge.clone());

    let response = app
        .oneshot(post_json(
            "/chat/completions",
            json!({"messages": [
                {"role": "assistant", "content": null},
                {"role": "user", "content": "Salam"}
            ]}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(bridge.prompts(), vec!["Salam"]);
}
