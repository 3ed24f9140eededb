//! [`RemoteCommandServer`] – WebSocket command surface for the operator UI.
//!
//! Listens on `0.0.0.0:5000` (configurable via
//! [`RemoteCommandServer::with_port`]). Each connection exchanges JSON
//! [`RemoteEvent`] frames downstream-to-upstream and JSON replies (or
//! binary camera frames) back. All connections share one
//! [`ControlSession`] behind an async mutex, so actuator commands never
//! interleave, and one [`FrameCache`] so the robot-side frame refresh
//! rate is a global limit rather than a per-client one.
//!
//! A lost robot session is fatal: the handler notifies the supervisor
//! channel and the process exits, relying on an external restart loop.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use presence_ambient::SpeechPipeline;
use presence_core::ControlSession;
use presence_types::{PresenceError, RemoteEvent};

use crate::frame::FrameCache;

/// Default TCP port for the remote command server.
pub const DEFAULT_PORT: u16 = 5000;

/// The shared robot session. `None` until a robot attaches; remote events
/// arriving before that are acknowledged benignly.
pub type SessionSlot = Arc<Mutex<Option<ControlSession>>>;

/// Reply frame sent back to the client.
#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Reply {
    Ack,
    /// No robot session yet; the event was dropped without harm.
    NoSession,
    Error { message: String },
}

impl Reply {
    fn into_message(self) -> Message {
        // Serializing this enum cannot fail; fall back to a bare ack if
        // it ever does.
        let json = serde_json::to_string(&self)
            .unwrap_or_else(|_| r#"{"type":"ack"}"#.to_string());
        Message::Text(json.into())
    }
}

// ---------------------------------------------------------------------------
// RemoteCommandServer
// ---------------------------------------------------------------------------

/// WebSocket server bridging remote clients to the shared control session.
pub struct RemoteCommandServer {
    session: SessionSlot,
    /// One cache for all clients, so the robot-side refresh rate stays
    /// bounded no matter how many connections poll for frames.
    frames: Arc<Mutex<FrameCache>>,
    pipeline: Option<Arc<SpeechPipeline>>,
    fatal: mpsc::Sender<PresenceError>,
    port: u16,
}

impl RemoteCommandServer {
    /// Create a server over `session` on the [`DEFAULT_PORT`]. Fatal
    /// session errors are reported on `fatal`.
    pub fn new(session: SessionSlot, fatal: mpsc::Sender<PresenceError>) -> Self {
        Self {
            session,
            frames: Arc::new(Mutex::new(FrameCache::new())),
            pipeline: None,
            fatal,
            port: DEFAULT_PORT,
        }
    }

    /// Route `say` events through the speech pipeline (builder-style).
    pub fn with_pipeline(mut self, pipeline: Arc<SpeechPipeline>) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Override the listening port (builder-style).
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Start the server and accept connections until the process exits.
    pub async fn run(self) -> Result<(), PresenceError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| PresenceError::Config(format!("bind error on {addr}: {e}")))?;
        info!(port = self.port, "remote command server listening");

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let session = Arc::clone(&self.session);
                    let frames = Arc::clone(&self.frames);
                    let pipeline = self.pipeline.clone();
                    let fatal = self.fatal.clone();
                    tokio::spawn(async move {
                        if let Err(err) =
                            handle_connection(stream, peer, session, frames, pipeline, fatal).await
                        {
                            warn!(%peer, %err, "client connection error");
                        }
                    });
                }
                Err(err) => warn!(%err, "accept error"),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Per-connection handler
// ---------------------------------------------------------------------------

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    session: SessionSlot,
    frames: Arc<Mutex<FrameCache>>,
    pipeline: Option<Arc<SpeechPipeline>>,
    fatal: mpsc::Sender<PresenceError>,
) -> Result<(), PresenceError> {
    let ws_stream = accept_async(stream)
        .await
        .map_err(|e| PresenceError::Config(format!("ws handshake from {peer}: {e}")))?;
    info!(%peer, "remote client connected");

    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    while let Some(msg) = ws_rx.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let event = match serde_json::from_str::<RemoteEvent>(text.as_str()) {
                    Ok(event) => event,
                    Err(err) => {
                        debug!(%peer, %err, "unparseable remote event");
                        let reply = Reply::Error {
                            message: format!("bad event: {err}"),
                        };
                        if ws_tx.send(reply.into_message()).await.is_err() {
                            break;
                        }
                        continue;
                    }
                };
                let outcome = dispatch(event, &session, pipeline.as_ref(), &frames).await;
                match acknowledge_benign(outcome) {
                    Ok(reply) => {
                        if ws_tx.send(reply).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        // The robot session is gone. Tell the supervisor
                        // and drop the client.
                        error!(%peer, %err, "robot session lost");
                        let _ = fatal.send(err).await;
                        break;
                    }
                }
            }
            Ok(Message::Close(_)) | Err(_) => break,
            _ => {}
        }
    }

    info!(%peer, "remote client disconnected");
    Ok(())
}

// ---------------------------------------------------------------------------
// Event dispatch
// ---------------------------------------------------------------------------

/// Map the benign no-session error to its `no_session` reply frame;
/// everything else passes through.
fn acknowledge_benign(
    outcome: Result<Message, PresenceError>,
) -> Result<Message, PresenceError> {
    match outcome {
        Err(PresenceError::NoActiveSession) => Ok(Reply::NoSession.into_message()),
        other => other,
    }
}

/// Apply one remote event to the shared session and build the reply frame.
///
/// Events arriving before a robot session is attached yield
/// [`PresenceError::NoActiveSession`] (except `image_get`, which serves
/// the placeholder); the connection loop downgrades that to a `no_session`
/// ack. [`PresenceError::ConnectionLost`] is the only fatal error; every
/// other failure becomes an error reply to the client.
async fn dispatch(
    event: RemoteEvent,
    session: &SessionSlot,
    pipeline: Option<&Arc<SpeechPipeline>>,
    frames: &Mutex<FrameCache>,
) -> Result<Message, PresenceError> {
    let mut slot = session.lock().await;
    let Some(active) = slot.as_mut() else {
        return match event {
            RemoteEvent::ImageGet => {
                Ok(Message::Binary(FrameCache::placeholder().to_vec().into()))
            }
            _ => {
                debug!(?event, "remote event before session attach");
                Err(PresenceError::NoActiveSession)
            }
        };
    };

    let reply = match event {
        RemoteEvent::Key {
            key_code,
            shift,
            ctrl,
            alt,
            down,
        } => {
            active.handle_key(key_code, shift, ctrl, alt, down)?;
            Reply::Ack
        }
        RemoteEvent::Mouse { x, y, .. } => {
            active.handle_mouse(x, y)?;
            Reply::Ack
        }
        RemoteEvent::MouseLook { enabled } => {
            active.set_mouse_look(enabled)?;
            Reply::Ack
        }
        RemoteEvent::AssignAnimation { slot: index, name } => {
            if active.animations_mut().assign(index, &name) {
                Reply::Ack
            } else {
                Reply::Error {
                    message: format!("unknown animation or slot: {name} -> {index}"),
                }
            }
        }
        RemoteEvent::Reset => {
            active.reset()?;
            Reply::Ack
        }
        RemoteEvent::ImageGet => {
            let bytes = frames.lock().await.get(active);
            return Ok(Message::Binary(bytes.into()));
        }
        RemoteEvent::Say { text } => {
            active.say_text(&text)?;
            // Narration runs on its own task so the ack never waits on
            // the synthesizer or the puzzle service.
            if let Some(pipeline) = pipeline {
                let pipeline = Arc::clone(pipeline);
                tokio::spawn(async move {
                    pipeline.process(&text).await;
                });
            }
            Reply::Ack
        }
    };
    Ok(reply.into_message())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
