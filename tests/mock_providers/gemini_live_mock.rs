//! WebSocket Mock Server for the Gemini Live API
//!
//! Accepts BidiGenerateContent sessions, records what the client sends and
//! replays a scripted sequence of server frames after the user turn.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::prelude::*;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

/// One scripted server action, run after the client's turn arrives
#[derive(Debug, Clone)]
pub enum MockAction {
    /// `serverContent` with one inline audio part per fragment, as a Text frame
    Audio(Vec<Vec<u8>>),
    /// `serverContent` with one inline audio part, as a Binary frame
    AudioBinary(Vec<u8>),
    /// `serverContent` with `turnComplete: true`
    TurnComplete,
    /// Audio and `turnComplete` in the same unit
    AudioWithTurnComplete(Vec<u8>),
    /// Arbitrary JSON as a Text frame
    Raw(Value),
    /// `goAway` notice
    GoAway,
    /// Close frame with an optional code and reason
    Close(Option<(CloseCode, &'static str)>),
    /// Drop the TCP connection without a close handshake
    Drop,
    /// Stop responding
    Hang,
    /// Wait for the client to close or drop the connection
    AwaitClientClose,
}

/// Recorded client traffic for one session
#[derive(Debug, Clone, Default)]
pub struct RecordedSession {
    pub uri: String,
    pub messages: Vec<Value>,
    /// The client closed or dropped the connection
    pub closed: bool,
}

/// Gemini Live mock server
pub struct GeminiLiveMock {
    pub url: String,
    sessions: Arc<Mutex<Vec<RecordedSession>>>,
}

impl GeminiLiveMock {
    /// Start a mock that answers `setupComplete` and then runs `script`
    pub async fn start(script: Vec<MockAction>) -> Self {
        Self::start_with(script, true).await
    }

    /// Start a mock that never acknowledges the setup message
    pub async fn start_without_setup_complete() -> Self {
        Self::start_with(vec![MockAction::Hang], false).await
    }

    async fn start_with(script: Vec<MockAction>, setup_complete: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let sessions = Arc::new(Mutex::new(Vec::new()));

        let recorded = sessions.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let script = script.clone();
                let recorded = recorded.clone();
                tokio::spawn(async move {
                    let _ = handle_connection(stream, script, setup_complete, recorded).await;
                });
            }
        });

        Self {
            url: format!("ws://{addr}/ws/live"),
            sessions,
        }
    }

    /// Sessions seen so far
    pub fn sessions(&self) -> Vec<RecordedSession> {
        self.sessions.lock().unwrap().clone()
    }
}

/// A `serverContent` unit carrying the given fragments as inline audio
pub fn audio_unit(fragments: &[Vec<u8>], turn_complete: bool) -> Value {
    let parts: Vec<Value> = fragments
        .iter()
        .map(|data| {
            json!({
                "inlineData": {
                    "mimeType": "audio/pcm;rate=24000",
                    "data": BASE64_STANDARD.encode(data),
                }
            })
        })
        .collect();

    json!({
        "serverContent": {
            "modelTurn": { "parts": parts },
            "turnComplete": turn_complete,
        }
    })
}

async fn handle_connection(
    stream: TcpStream,
    script: Vec<MockAction>,
    setup_complete: bool,
    recorded: Arc<Mutex<Vec<RecordedSession>>>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let uri = Arc::new(Mutex::new(String::new()));
    let uri_slot = uri.clone();
    let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
        *uri_slot.lock().unwrap() = req.uri().to_string();
        Ok(resp)
    };

    let ws_stream = accept_hdr_async(stream, callback).await?;
    let (mut write, mut read) = ws_stream.split();

    let index = {
        let mut sessions = recorded.lock().unwrap();
        sessions.push(RecordedSession {
            uri: uri.lock().unwrap().clone(),
            messages: Vec::new(),
            closed: false,
        });
        sessions.len() - 1
    };

    // setup, then the user turn
    let mut turn_received = false;
    while let Some(msg) = read.next().await {
        let text = match msg? {
            Message::Text(text) => text.to_string(),
            Message::Close(_) => return Ok(()),
            _ => continue,
        };
        let value: Value = serde_json::from_str(&text)?;
        recorded.lock().unwrap()[index].messages.push(value.clone());

        if value.get("setup").is_some() {
            if setup_complete {
                write
                    .send(Message::Text(json!({"setupComplete": {}}).to_string().into()))
                    .await?;
            }
        } else if value.get("clientContent").is_some() {
            turn_received = true;
            break;
        }
    }

    if !turn_received {
        return Ok(());
    }

    for action in script {
        match action {
            MockAction::Audio(fragments) => {
                let unit = audio_unit(&fragments, false);
                write.send(Message::Text(unit.to_string().into())).await?;
            }
            MockAction::AudioBinary(fragment) => {
                let unit = audio_unit(&[fragment], false);
                write.send(Message::Binary(unit.to_string().into_bytes().into())).await?;
            }
            MockAction::TurnComplete => {
                let unit = json!({"serverContent": {"turnComplete": true}});
                write.send(Message::Text(unit.to_string().into())).await?;
            }
            MockAction::AudioWithTurnComplete(fragment) => {
                let unit = audio_unit(&[fragment], true);
                write.send(Message::Text(unit.to_string().into())).await?;
            }
            MockAction::Raw(value) => {
                write.send(Message::Text(value.to_string().into())).await?;
            }
            MockAction::GoAway => {
                let unit = json!({"goAway": {"timeLeft": "10s"}});
                write.send(Message::Text(unit.to_string().into())).await?;
            }
            MockAction::Close(frame) => {
                let frame = frame.map(|(code, reason)| CloseFrame {
                    code,
                    reason: reason.into(),
                });
                write.send(Message::Close(frame)).await?;
                return Ok(());
            }
            MockAction::Drop => return Ok(()),
            MockAction::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                return Ok(());
            }
            MockAction::AwaitClientClose => break,
        }
    }

    // Drain until the client closes
    while let Some(Ok(msg)) = read.next().await {
        if msg.is_close() {
            break;
        }
    }
    recorded.lock().unwrap()[index].closed = true;

    Ok(())
}
