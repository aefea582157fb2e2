//! One-shot Gemini Live session.
//!
//! A [`LiveSession`] owns a single WebSocket connection for the duration of
//! one exchange: open and set up, send one complete user turn, then drain
//! response units until the server signals turn completion or the socket
//! ends. Every network step is bounded by the session deadline.
//!
//! The session is never shared. Dropping it drops the socket, which is how
//! cancellation of a streaming consumer reaches the upstream connection.

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout_at};
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use super::messages::{ClientMessage, ServerMessage};
use crate::core::realtime::base::{RealtimeError, RealtimeResult};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Parameters of the setup message.
#[derive(Debug, Clone)]
pub(crate) struct SessionSetup {
    pub model: String,
    pub voice: String,
    pub instruction: Option<String>,
}

/// An open, set-up Gemini Live session.
pub(crate) struct LiveSession {
    ws: WsStream,
    deadline: Instant,
    turn_complete: bool,
}

impl LiveSession {
    /// Connect to `url`, send the setup message and wait for `setupComplete`.
    ///
    /// `log_url` is the endpoint without credentials, used for logging only.
    pub async fn open(
        url: &str,
        log_url: &str,
        setup: &SessionSetup,
        deadline: Instant,
    ) -> RealtimeResult<Self> {
        let (ws, _response) = timeout_at(deadline, tokio_tungstenite::connect_async(url))
            .await
            .map_err(|_| RealtimeError::Timeout(format!("connecting to {log_url}")))?
            .map_err(|e| RealtimeError::ConnectionFailed(e.to_string()))?;

        debug!("Connected to Gemini Live endpoint {}", log_url);

        let mut session = Self {
            ws,
            deadline,
            turn_complete: false,
        };

        let setup_message = ClientMessage::audio_setup(
            setup.model.clone(),
            &setup.voice,
            setup.instruction.as_deref(),
        );
        session.send(&setup_message).await?;
        session.await_setup_complete().await?;

        info!(model = %setup.model, voice = %setup.voice, "Gemini Live session ready");
        Ok(session)
    }

    /// Send `text` as one complete user turn.
    pub async fn send_turn(&mut self, text: &str) -> RealtimeResult<()> {
        self.send(&ClientMessage::user_turn(text)).await
    }

    /// Receive the next batch of audio fragments.
    ///
    /// Returns `Ok(None)` once the turn is complete or the socket has ended.
    /// A batch may be empty when a response unit carries no inline data.
    pub async fn next_fragments(&mut self) -> RealtimeResult<Option<Vec<Bytes>>> {
        if self.turn_complete {
            return Ok(None);
        }

        let Some(message) = self.recv().await? else {
            debug!("Gemini Live socket ended before turn completion");
            self.turn_complete = true;
            return Ok(None);
        };

        if let Some(go_away) = &message.go_away {
            warn!("Gemini Live server sent goAway (time left: {:?})", go_away.time_left);
        }

        let Some(content) = message.server_content else {
            return Ok(Some(Vec::new()));
        };

        let fragments = content.audio_fragments()?;
        debug!(
            fragments = fragments.len(),
            turn_complete = content.turn_complete,
            interrupted = content.interrupted,
            "Received Gemini Live response unit"
        );

        if content.turn_complete {
            self.turn_complete = true;
        }

        Ok(Some(fragments))
    }

    /// Close the socket politely. Errors are ignored since the exchange is over.
    pub async fn close(mut self) {
        match timeout_at(self.deadline, self.ws.close(None)).await {
            Ok(Ok(())) => debug!("Gemini Live session closed"),
            Ok(Err(e)) => debug!("Gemini Live close failed: {}", e),
            Err(_) => debug!("Gemini Live close did not finish before deadline"),
        }
    }

    async fn send(&mut self, message: &ClientMessage) -> RealtimeResult<()> {
        let json = message.to_json()?;
        timeout_at(self.deadline, self.ws.send(Message::Text(json.into())))
            .await
            .map_err(|_| RealtimeError::Timeout("sending to Gemini Live".to_string()))?
            .map_err(|e| RealtimeError::WebSocketError(e.to_string()))
    }

    async fn await_setup_complete(&mut self) -> RealtimeResult<()> {
        loop {
            match self.recv().await? {
                Some(message) if message.setup_complete.is_some() => return Ok(()),
                Some(_) => debug!("Ignoring Gemini Live message received before setupComplete"),
                None => {
                    return Err(RealtimeError::ConnectionFailed(
                        "connection closed before setup completed".to_string(),
                    ));
                }
            }
        }
    }

    /// Read the next JSON message, skipping control frames.
    ///
    /// Returns `Ok(None)` on a Close frame or end of stream.
    async fn recv(&mut self) -> RealtimeResult<Option<ServerMessage>> {
        loop {
            let frame = timeout_at(self.deadline, self.ws.next())
                .await
                .map_err(|_| {
                    RealtimeError::Timeout("waiting for Gemini Live response".to_string())
                })?;

            let raw = match frame {
                None => return Ok(None),
                Some(Err(e)) if is_end_of_socket(&e) => {
                    debug!("Gemini Live socket ended: {}", e);
                    return Ok(None);
                }
                Some(Err(e)) => return Err(RealtimeError::WebSocketError(e.to_string())),
                Some(Ok(Message::Text(text))) => Bytes::copy_from_slice(text.as_bytes()),
                Some(Ok(Message::Binary(data))) => data,
                Some(Ok(Message::Close(Some(frame)))) if frame.code != CloseCode::Normal => {
                    return Err(RealtimeError::ProviderError(format!(
                        "session closed by server ({}): {}",
                        u16::from(frame.code),
                        frame.reason.as_str()
                    )));
                }
                Some(Ok(Message::Close(_))) => return Ok(None),
                // Ping/Pong are answered by tungstenite itself
                Some(Ok(_)) => continue,
            };

            return ServerMessage::parse(&raw).map(Some);
        }
    }
}

/// Transport errors that only mean the peer went away.
fn is_end_of_socket(error: &WsError) -> bool {
    matches!(
        error,
        WsError::ConnectionClosed
            | WsError::AlreadyClosed
            | WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake)
    )
}
