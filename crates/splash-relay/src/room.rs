//! Room actor: an isolated Tokio task owning one room's roster and
//! snapshot.
//!
//! Each room processes its commands to completion, one at a time, so
//! roster and snapshot mutation is race-free by construction. Separate
//! rooms are fully isolated tasks.

use std::collections::HashMap;

use splash_protocol::{ActionKind, ClientMessage, GameAction, Identity, ServerMessage, StatePayload};
use tokio::sync::mpsc;

use crate::{ConnectionId, RelayError};

/// Default command channel size for room actors.
pub(crate) const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Channel sender delivering outbound messages to one socket's writer.
pub type ClientSender = mpsc::UnboundedSender<ServerMessage>;

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    /// Register a freshly accepted socket, not yet joined.
    Open {
        conn: ConnectionId,
        sender: ClientSender,
    },
    /// A decoded message from a socket.
    Inbound {
        conn: ConnectionId,
        msg: ClientMessage,
    },
    /// The socket closed (cleanly or not).
    Closed { conn: ConnectionId },
}

/// Handle to a running room actor. Cheap to clone.
#[derive(Clone)]
pub struct RoomHandle {
    code: String,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// The room's normalized code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Registers a new socket with the room.
    pub async fn open(&self, conn: ConnectionId, sender: ClientSender) -> Result<(), RelayError> {
        self.send(RoomCommand::Open { conn, sender }).await
    }

    /// Delivers a decoded client message.
    pub async fn inbound(&self, conn: ConnectionId, msg: ClientMessage) -> Result<(), RelayError> {
        self.send(RoomCommand::Inbound { conn, msg }).await
    }

    /// Reports a closed socket.
    pub async fn closed(&self, conn: ConnectionId) -> Result<(), RelayError> {
        self.send(RoomCommand::Closed { conn }).await
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RelayError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RelayError::RoomUnavailable(self.code.clone()))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    code: String,
    /// Seat roster in join order. Entries are never removed or
    /// reshuffled, so seats stay stable across disconnects.
    roster: Vec<Identity>,
    /// Sockets that opened but have not joined yet.
    pending: HashMap<ConnectionId, ClientSender>,
    /// Live sockets keyed by client identity token.
    sockets: HashMap<String, (ConnectionId, ClientSender)>,
    /// Which identity each joined connection claimed.
    joined: HashMap<ConnectionId, String>,
    /// The last-accepted snapshot, stored verbatim.
    game_state: Option<splash_protocol::GameState>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop until every handle is dropped.
    async fn run(mut self) {
        tracing::info!(room = %self.code, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Open { conn, sender } => {
                    self.pending.insert(conn, sender);
                }
                RoomCommand::Inbound { conn, msg } => self.handle_inbound(conn, msg),
                RoomCommand::Closed { conn } => self.handle_closed(conn),
            }
        }

        tracing::info!(room = %self.code, "room actor stopped");
    }

    fn handle_inbound(&mut self, conn: ConnectionId, msg: ClientMessage) {
        match msg {
            ClientMessage::Join { id, name } => self.handle_join(conn, id, name),
            ClientMessage::Action { action } => self.handle_action(conn, action),
            ClientMessage::Ping => {
                self.send_to_conn(conn, ServerMessage::Pong);
            }
        }
    }

    /// Assigns (or re-finds) the identity's seat, binds the socket,
    /// welcomes the joiner, and broadcasts the roster. A stored
    /// snapshot goes to the newly joined socket only.
    fn handle_join(&mut self, conn: ConnectionId, id: String, name: String) {
        let seat = match self.roster.iter().position(|p| p.id == id) {
            Some(seat) => {
                self.roster[seat].name = name;
                seat
            }
            None => {
                let seat = self.roster.len();
                self.roster.push(Identity {
                    id: id.clone(),
                    name,
                    seat,
                });
                seat
            }
        };

        let Some(sender) = self.sender_for(conn) else {
            tracing::warn!(room = %self.code, %conn, "join from unknown socket");
            return;
        };
        self.pending.remove(&conn);
        self.sockets.insert(id.clone(), (conn, sender.clone()));
        self.joined.insert(conn, id);

        tracing::info!(room = %self.code, %conn, seat, "player joined");

        let _ = sender.send(ServerMessage::Welcome { seat });
        self.broadcast_roster();
        if let Some(state) = &self.game_state {
            let _ = sender.send(ServerMessage::State {
                payload: StatePayload {
                    state: state.clone(),
                },
            });
        }
    }

    /// The authority gate. Accepted snapshots are stored verbatim and
    /// broadcast; everything else is dropped with no reply — the
    /// offending sender just never sees its state echoed back.
    fn handle_action(&mut self, conn: ConnectionId, action: GameAction) {
        let Some(seat) = self.seat_of(conn) else {
            tracing::debug!(room = %self.code, %conn, "action before join, ignoring");
            return;
        };

        match action.kind {
            ActionKind::Start => {
                if seat != 0 {
                    tracing::debug!(
                        room = %self.code,
                        seat,
                        "start from non-host, ignoring"
                    );
                    return;
                }
            }
            ActionKind::Update => {
                let Some(current) = self.game_state.as_ref().map(|s| s.current_player) else {
                    tracing::debug!(room = %self.code, seat, "update with no game, ignoring");
                    return;
                };
                if seat != current {
                    tracing::debug!(
                        room = %self.code,
                        seat,
                        current,
                        "update out of turn, ignoring"
                    );
                    return;
                }
            }
        }

        self.game_state = Some(action.state.clone());
        self.broadcast(ServerMessage::State {
            payload: StatePayload {
                state: action.state,
            },
        });
    }

    /// Unbinds the socket. The roster entry (and seat) is retained so
    /// seats never reshuffle; only the broadcast roster shrinks.
    fn handle_closed(&mut self, conn: ConnectionId) {
        self.pending.remove(&conn);
        let Some(id) = self.joined.remove(&conn) else {
            return;
        };
        // A newer connection may already own this identity's socket.
        if self.sockets.get(&id).is_some_and(|(c, _)| *c == conn) {
            self.sockets.remove(&id);
        }
        tracing::info!(room = %self.code, %conn, "player left");
        self.broadcast_roster();
    }

    fn seat_of(&self, conn: ConnectionId) -> Option<usize> {
        let id = self.joined.get(&conn)?;
        self.roster.iter().position(|p| &p.id == id)
    }

    fn sender_for(&self, conn: ConnectionId) -> Option<ClientSender> {
        if let Some(sender) = self.pending.get(&conn) {
            return Some(sender.clone());
        }
        self.sockets
            .values()
            .find(|(c, _)| *c == conn)
            .map(|(_, sender)| sender.clone())
    }

    fn send_to_conn(&self, conn: ConnectionId, msg: ServerMessage) {
        if let Some(sender) = self.sender_for(conn) {
            let _ = sender.send(msg);
        }
    }

    /// Broadcasts the roster filtered to identities with a live socket.
    fn broadcast_roster(&self) {
        let players: Vec<Identity> = self
            .roster
            .iter()
            .filter(|p| self.sockets.contains_key(&p.id))
            .cloned()
            .collect();
        self.broadcast(ServerMessage::Players { players });
    }

    /// Sends to every live socket; gone receivers are silently skipped.
    fn broadcast(&self, msg: ServerMessage) {
        for (_, sender) in self.sockets.values() {
            let _ = sender.send(msg.clone());
        }
    }
}

/// Spawns a new room actor task and returns a handle to it.
pub fn spawn_room(code: String) -> RoomHandle {
    let (tx, rx) = mpsc::channel(DEFAULT_CHANNEL_SIZE);

    let actor = RoomActor {
        code: code.clone(),
        roster: Vec::new(),
        pending: HashMap::new(),
        sockets: HashMap::new(),
        joined: HashMap::new(),
        game_state: None,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
