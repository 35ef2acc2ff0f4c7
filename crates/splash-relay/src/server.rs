//! Relay server: accept loop and per-socket plumbing.
//!
//! Each accepted socket gets its own task. The websocket upgrade must
//! carry a `?room=<code>` query parameter selecting the actor; requests
//! without one are rejected with HTTP 400 during the handshake. After
//! the upgrade, the socket task only shuttles bytes:
//! decoded messages go to the room actor, typed replies come back over
//! an unbounded channel and are encoded at the edge by a writer task.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use splash_protocol::{ClientMessage, Codec, JsonCodec, ServerMessage};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;

use crate::manager::normalize_room_code;
use crate::{ConnectionId, RelayError, RoomHandle, RoomManager};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// A running Splash relay. Call [`run`](Self::run) to start serving.
pub struct RelayServer {
    listener: TcpListener,
    rooms: Arc<Mutex<RoomManager>>,
}

impl RelayServer {
    /// Binds the relay to the given address.
    pub async fn bind(addr: &str) -> Result<Self, RelayError> {
        let listener = TcpListener::bind(addr).await.map_err(RelayError::Bind)?;
        tracing::info!(addr, "relay listening");
        Ok(Self {
            listener,
            rooms: Arc::new(Mutex::new(RoomManager::new())),
        })
    }

    /// Returns the local address the relay is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), RelayError> {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let rooms = Arc::clone(&self.rooms);
                    tokio::spawn(async move {
                        if let Err(e) = handle_socket(stream, rooms).await {
                            tracing::debug!(%peer, error = %e, "socket ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// Extracts and normalizes the room code from a request query string.
fn room_code_from_query(query: &str) -> Option<String> {
    query
        .split('&')
        .find_map(|kv| kv.strip_prefix("room="))
        .and_then(normalize_room_code)
}

fn missing_room_response() -> ErrorResponse {
    let mut resp = ErrorResponse::new(Some("Missing room code".to_string()));
    *resp.status_mut() = StatusCode::BAD_REQUEST;
    resp
}

/// Drives one socket from upgrade to close.
async fn handle_socket(
    stream: TcpStream,
    rooms: Arc<Mutex<RoomManager>>,
) -> Result<(), RelayError> {
    // Capture the room code during the upgrade so a bad request can be
    // rejected with a proper HTTP status instead of a dangling socket.
    let mut code: Option<String> = None;
    let ws = tokio_tungstenite::accept_hdr_async(stream, |req: &Request, resp: Response| {
        code = req.uri().query().and_then(room_code_from_query);
        if code.is_none() {
            return Err(missing_room_response());
        }
        Ok(resp)
    })
    .await?;
    let code = code.ok_or(RelayError::MissingRoomCode)?;

    let conn = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
    tracing::debug!(%conn, room = %code, "accepted socket");

    let room: RoomHandle = rooms.lock().await.room(&code);

    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ServerMessage>();
    room.open(conn, out_tx).await?;

    let (mut sink, mut source) = ws.split();
    let codec = JsonCodec;

    // Writer: typed messages out of the room, encoded here at the edge.
    let writer = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            match codec.encode(&msg) {
                Ok(bytes) => {
                    if sink.send(Message::Binary(bytes.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "dropping unencodable message");
                }
            }
        }
        let _ = sink.close().await;
    });

    // Reader: frames in, malformed JSON silently discarded (fail-closed).
    while let Some(frame) = source.next().await {
        let data: Vec<u8> = match frame {
            Ok(Message::Binary(data)) => data.into(),
            Ok(Message::Text(text)) => text.as_bytes().to_vec(),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue, // transport ping/pong/frame
            Err(e) => {
                tracing::debug!(%conn, error = %e, "recv error");
                break;
            }
        };

        let msg: ClientMessage = match codec.decode(&data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(%conn, error = %e, "discarding malformed message");
                continue;
            }
        };

        if room.inbound(conn, msg).await.is_err() {
            break;
        }
    }

    let _ = room.closed(conn).await;
    writer.abort();
    Ok(())
}
