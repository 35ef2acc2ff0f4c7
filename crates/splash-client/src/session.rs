//! The client session: one player's live view of a room.
//!
//! A [`GameSession`] owns the websocket, replicates the relay's
//! broadcasts into a local snapshot, and dispatches actions by
//! validating them locally first. The relay never checks rules, so this
//! is where legality lives: an illegal play is rejected here and never
//! leaves the process.
//!
//! State handling is optimistic. Dispatch applies the action to a
//! *draft* copy of the confirmed snapshot and submits the result; the
//! draft is what accessors see until the next authoritative broadcast
//! arrives and replaces everything. On the happy path that broadcast is
//! our own submission echoed back, so nothing visibly changes.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use splash_protocol::{
    ActionKind, CardId, ClientMessage, Codec, GameAction, GameState, Identity, JsonCodec, Rank,
    ServerMessage,
};
use splash_rules::{apply_pickup, apply_play, can_play_on_top, new_game, validate_selection};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::{ActionError, EventBus, SessionError, SessionEvent};

// ---------------------------------------------------------------------------
// Config and phase
// ---------------------------------------------------------------------------

/// Tunables for a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Interval between keep-alive pings.
    pub heartbeat_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(30),
        }
    }
}

/// Where the session is in its lifecycle.
///
/// ```text
/// Disconnected → Connecting → Connected → Seated → InGame
///       ↑_______________(disconnect)_______________|
/// ```
///
/// Transitions past `Connected` are driven solely by inbound messages:
/// `welcome` seats us, the first `state` broadcast puts us in a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Disconnected,
    Connecting,
    Connected,
    Seated,
    InGame,
}

// ---------------------------------------------------------------------------
// GameSession
// ---------------------------------------------------------------------------

/// Mutable session state, shared between caller dispatch, the reader
/// task and the heartbeat task. Never held across an await.
struct Inner {
    phase: SessionPhase,
    seat: Option<usize>,
    roster: Vec<Identity>,
    /// Last authoritative snapshot from the relay.
    confirmed: Option<GameState>,
    /// Optimistic copy with local actions applied. Dropped on every
    /// authoritative broadcast.
    draft: Option<GameState>,
    outbound: Option<mpsc::UnboundedSender<ClientMessage>>,
    tasks: Vec<JoinHandle<()>>,
}

impl Inner {
    fn new() -> Self {
        Self {
            phase: SessionPhase::Disconnected,
            seat: None,
            roster: Vec::new(),
            confirmed: None,
            draft: None,
            outbound: None,
            tasks: Vec::new(),
        }
    }

    /// The snapshot accessors and dispatch should act on: the draft if
    /// one is pending, the confirmed state otherwise.
    fn visible_state(&self) -> Option<&GameState> {
        self.draft.as_ref().or(self.confirmed.as_ref())
    }

    fn abort_tasks(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

/// A connected (or connectable) player in a Splash room.
pub struct GameSession {
    /// Random identity token. The relay keys seats by this, so a
    /// session that reconnects with the same token gets its seat back.
    id: String,
    name: String,
    config: SessionConfig,
    events: Arc<EventBus>,
    inner: Arc<Mutex<Inner>>,
}

impl GameSession {
    /// Creates a disconnected session with a fresh identity token.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, SessionConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: SessionConfig) -> Self {
        Self {
            id: generate_client_id(),
            name: name.into(),
            config,
            events: Arc::new(EventBus::new()),
            inner: Arc::new(Mutex::new(Inner::new())),
        }
    }

    /// The session's identity token.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The event bus for this session. Subscribe here before calling
    /// [`connect`](Self::connect) to observe the join traffic.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    // -- connection lifecycle ------------------------------------------------

    /// Connects to `addr` and joins `room`.
    ///
    /// Spawns the writer, reader and heartbeat tasks, then sends the
    /// `join` message. Seat assignment arrives asynchronously as a
    /// [`SessionEvent::SeatAssigned`] event.
    pub async fn connect(&self, addr: &str, room: &str) -> Result<(), SessionError> {
        {
            let mut inner = self.lock();
            if inner.phase != SessionPhase::Disconnected {
                return Err(SessionError::AlreadyConnected);
            }
            inner.abort_tasks();
            inner.phase = SessionPhase::Connecting;
        }

        let url = format!("ws://{addr}/?room={room}");
        let ws = match connect_async(&url).await {
            Ok((ws, _)) => ws,
            Err(e) => {
                self.lock().phase = SessionPhase::Disconnected;
                return Err(SessionError::Connect(e));
            }
        };
        tracing::debug!(%url, "connected to relay");

        let (mut sink, mut source) = ws.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ClientMessage>();
        let codec = JsonCodec;

        // Publish the connected state before the reader task exists, so
        // a fast welcome can never observe a stale phase.
        {
            let mut inner = self.lock();
            inner.phase = SessionPhase::Connected;
            inner.outbound = Some(out_tx.clone());
        }
        self.events.publish(&SessionEvent::ConnectionOpened);

        // Writer: typed messages from dispatch, encoded at the edge.
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

        // Reader: replicate broadcasts into the shared state.
        let reader_inner = Arc::clone(&self.inner);
        let reader_events = Arc::clone(&self.events);
        let reader = tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                let data: Vec<u8> = match frame {
                    Ok(Message::Binary(data)) => data.into(),
                    Ok(Message::Text(text)) => text.as_bytes().to_vec(),
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        reader_events.publish(&SessionEvent::ConnectionError(e.to_string()));
                        break;
                    }
                };
                let msg: ServerMessage = match codec.decode(&data) {
                    Ok(msg) => msg,
                    Err(e) => {
                        tracing::debug!(error = %e, "discarding malformed frame");
                        continue;
                    }
                };
                for event in apply_inbound(&reader_inner, msg) {
                    reader_events.publish(&event);
                }
            }

            // Transport gone. Seat, roster and snapshot are kept so a
            // reconnect under the same token resumes where it was.
            {
                let mut inner = reader_inner.lock().expect("session lock poisoned");
                inner.phase = SessionPhase::Disconnected;
                inner.outbound = None;
            }
            reader_events.publish(&SessionEvent::ConnectionClosed);
        });

        // Heartbeat: a ping on every tick until the writer is gone.
        let heartbeat_tx = out_tx.clone();
        let heartbeat_interval = self.config.heartbeat_interval;
        let heartbeat = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(heartbeat_interval);
            ticker.tick().await; // the immediate first tick
            loop {
                ticker.tick().await;
                if heartbeat_tx.send(ClientMessage::Ping).is_err() {
                    break;
                }
            }
        });

        let join = ClientMessage::Join {
            id: self.id.clone(),
            name: self.name.clone(),
        };
        // The writer task owns the sink, so this cannot fail here.
        let _ = out_tx.send(join);

        self.lock().tasks = vec![writer, reader, heartbeat];
        Ok(())
    }

    /// Tears the connection down and forgets everything: seat, roster
    /// and snapshot. The identity token survives, so a later `connect`
    /// to the same room reclaims the old seat.
    pub fn disconnect(&self) {
        {
            let mut inner = self.lock();
            if inner.phase == SessionPhase::Disconnected && inner.outbound.is_none() {
                return;
            }
            inner.abort_tasks();
            inner.phase = SessionPhase::Disconnected;
            inner.seat = None;
            inner.roster.clear();
            inner.confirmed = None;
            inner.draft = None;
            inner.outbound = None;
        }
        self.events.publish(&SessionEvent::ConnectionClosed);
    }

    // -- dispatch ------------------------------------------------------------

    /// Deals a fresh game for the current roster and submits it as
    /// `START`. Host only.
    pub fn start_game(&self) -> Result<(), ActionError> {
        let mut inner = self.lock();
        let tx = inner.outbound.clone().ok_or(ActionError::NotConnected)?;
        let seat = inner.seat.ok_or(ActionError::NotConnected)?;
        if seat != 0 {
            return Err(ActionError::NotHost);
        }

        let state = new_game(&inner.roster)?;
        inner.draft = Some(state.clone());
        let _ = tx.send(ClientMessage::Action {
            action: GameAction {
                kind: ActionKind::Start,
                state,
            },
        });
        Ok(())
    }

    /// Plays the selected cards, submitting the resulting snapshot as
    /// `UPDATE`. Validation happens locally; an illegal selection is
    /// returned as an error and nothing is sent.
    pub fn play(&self, selected: &[CardId]) -> Result<(), ActionError> {
        self.dispatch_update(|state, seat| {
            let selection = validate_selection(state, seat, selected)?;
            apply_play(state, selection);
            Ok(())
        })
    }

    /// Picks up the pile into our hand and passes the turn.
    pub fn pickup(&self) -> Result<(), ActionError> {
        self.dispatch_update(|state, seat| {
            apply_pickup(state, seat)?;
            Ok(())
        })
    }

    /// Applies `action` to a draft of the visible snapshot and submits
    /// the result as `UPDATE` if it succeeded.
    fn dispatch_update(
        &self,
        action: impl FnOnce(&mut GameState, usize) -> Result<(), ActionError>,
    ) -> Result<(), ActionError> {
        let mut inner = self.lock();
        let tx = inner.outbound.clone().ok_or(ActionError::NotConnected)?;
        let seat = inner.seat.ok_or(ActionError::NotConnected)?;
        if inner.phase != SessionPhase::InGame {
            return Err(ActionError::NoGame);
        }
        let mut next = inner.visible_state().cloned().ok_or(ActionError::NoGame)?;

        action(&mut next, seat)?;

        inner.draft = Some(next.clone());
        let _ = tx.send(ClientMessage::Action {
            action: GameAction {
                kind: ActionKind::Update,
                state: next,
            },
        });
        Ok(())
    }

    // -- accessors -----------------------------------------------------------

    pub fn phase(&self) -> SessionPhase {
        self.lock().phase
    }

    pub fn seat(&self) -> Option<usize> {
        self.lock().seat
    }

    /// Our roster entry, if seated and present in the live roster.
    pub fn me(&self) -> Option<Identity> {
        let inner = self.lock();
        let seat = inner.seat?;
        inner.roster.iter().find(|p| p.seat == seat).cloned()
    }

    /// Seat 0 runs the room: only it may start games.
    pub fn is_host(&self) -> bool {
        self.lock().seat == Some(0)
    }

    pub fn is_my_turn(&self) -> bool {
        let inner = self.lock();
        if inner.phase != SessionPhase::InGame {
            return false;
        }
        match (inner.seat, inner.visible_state()) {
            (Some(seat), Some(state)) => state.current_player == seat,
            _ => false,
        }
    }

    /// The snapshot the UI should render: the optimistic draft if one
    /// is pending, the confirmed state otherwise.
    pub fn game_state(&self) -> Option<GameState> {
        self.lock().visible_state().cloned()
    }

    pub fn roster(&self) -> Vec<Identity> {
        self.lock().roster.clone()
    }

    pub fn top_rank(&self) -> Option<Rank> {
        self.lock().visible_state().and_then(|s| s.top_rank())
    }

    /// Whether `rank` would currently be legal on the pile.
    pub fn can_play(&self, rank: Rank) -> bool {
        self.lock()
            .visible_state()
            .is_some_and(|s| can_play_on_top(s, rank))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("session lock poisoned")
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.abort_tasks();
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound replication
// ---------------------------------------------------------------------------

/// Applies one relay message to the shared state and returns the
/// events to publish. Events are returned rather than published inline
/// so the lock is released before any observer runs.
fn apply_inbound(inner: &Arc<Mutex<Inner>>, msg: ServerMessage) -> Vec<SessionEvent> {
    let mut inner = inner.lock().expect("session lock poisoned");
    let mut events = Vec::new();

    match msg {
        ServerMessage::Welcome { seat } => {
            inner.seat = Some(seat);
            if matches!(
                inner.phase,
                SessionPhase::Connecting | SessionPhase::Connected
            ) {
                inner.phase = SessionPhase::Seated;
            }
            events.push(SessionEvent::SeatAssigned(seat));
        }
        ServerMessage::Players { players } => {
            inner.roster = players.clone();
            if inner.phase == SessionPhase::InGame {
                // Mid-game the roster only refreshes display names;
                // seats and card zones are untouched.
                if let Some(state) = inner.confirmed.as_mut() {
                    merge_roster_names(state, &players);
                }
            } else {
                // Before a game the stored snapshot is only a preview:
                // rebuild it so late joiners show up in it.
                inner.confirmed = Some(GameState::skeleton(&players));
            }
            events.push(SessionEvent::RosterUpdated(players));
        }
        ServerMessage::State { payload } => {
            inner.confirmed = Some(payload.state.clone());
            inner.draft = None;
            inner.phase = SessionPhase::InGame;
            events.push(SessionEvent::StateUpdated(payload.state));
        }
        ServerMessage::Pong => {}
    }

    events
}

/// Copies roster display names into the matching seats of a snapshot.
fn merge_roster_names(state: &mut GameState, roster: &[Identity]) {
    for player in roster {
        if let Some(seat) = state.players.get_mut(player.seat) {
            seat.name = player.name.clone();
        }
    }
}

/// 128-bit random hex token identifying this client to the relay.
fn generate_client_id() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(id: &str, name: &str, seat: usize) -> Identity {
        Identity {
            id: id.into(),
            name: name.into(),
            seat,
        }
    }

    fn inner_with_phase(phase: SessionPhase) -> Arc<Mutex<Inner>> {
        let mut inner = Inner::new();
        inner.phase = phase;
        Arc::new(Mutex::new(inner))
    }

    #[test]
    fn test_welcome_seats_a_still_connecting_session() {
        // The welcome can arrive before connect() finishes its own
        // bookkeeping; it must still seat the session.
        let inner = inner_with_phase(SessionPhase::Connecting);
        let events = apply_inbound(&inner, ServerMessage::Welcome { seat: 1 });

        let guard = inner.lock().unwrap();
        assert_eq!(guard.phase, SessionPhase::Seated);
        assert_eq!(guard.seat, Some(1));
        assert!(matches!(events[..], [SessionEvent::SeatAssigned(1)]));
    }

    #[test]
    fn test_pregame_roster_updates_rebuild_the_preview() {
        let inner = inner_with_phase(SessionPhase::Seated);

        let first = vec![named("a", "ana", 0)];
        apply_inbound(
            &inner,
            ServerMessage::Players {
                players: first,
            },
        );
        let grown = vec![named("a", "ana", 0), named("b", "bo", 1)];
        apply_inbound(
            &inner,
            ServerMessage::Players {
                players: grown,
            },
        );

        let guard = inner.lock().unwrap();
        let preview = guard.confirmed.as_ref().unwrap();
        assert_eq!(preview.players.len(), 2, "preview follows the roster");
        assert_eq!(preview.players[1].name, "bo");
        assert_eq!(preview.card_count(), 0);
    }

    #[test]
    fn test_ingame_roster_update_merges_names_only() {
        let inner = inner_with_phase(SessionPhase::InGame);
        let roster = vec![named("a", "ana", 0), named("b", "bo", 1)];
        {
            let mut guard = inner.lock().unwrap();
            let mut state = GameState::skeleton(&roster);
            state.players[1].hand.push(splash_protocol::Card {
                id: splash_protocol::CardId("K♣#1".into()),
                rank: Rank::King,
                suit: splash_protocol::Suit::Clubs,
            });
            guard.confirmed = Some(state);
        }

        let renamed = vec![named("a", "ana", 0), named("b", "bobby", 1)];
        apply_inbound(&inner, ServerMessage::Players { players: renamed });

        let guard = inner.lock().unwrap();
        let state = guard.confirmed.as_ref().unwrap();
        assert_eq!(state.players[1].name, "bobby");
        assert_eq!(state.players[1].hand.len(), 1, "zones untouched");
    }

    #[test]
    fn test_client_ids_are_32_hex_chars_and_unique() {
        let a = generate_client_id();
        let b = generate_client_id();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_merge_roster_names_updates_names_only() {
        let roster = vec![
            Identity {
                id: "a".into(),
                name: "ana".into(),
                seat: 0,
            },
            Identity {
                id: "b".into(),
                name: "bo".into(),
                seat: 1,
            },
        ];
        let mut state = GameState::skeleton(&roster);
        let emoji_before = state.players[1].emoji.clone();

        let renamed = vec![Identity {
            id: "b".into(),
            name: "bobby".into(),
            seat: 1,
        }];
        merge_roster_names(&mut state, &renamed);

        assert_eq!(state.players[0].name, "ana");
        assert_eq!(state.players[1].name, "bobby");
        assert_eq!(state.players[1].emoji, emoji_before);
    }

    #[test]
    fn test_new_session_starts_disconnected() {
        let session = GameSession::new("ana");
        assert_eq!(session.phase(), SessionPhase::Disconnected);
        assert_eq!(session.seat(), None);
        assert!(!session.is_host());
        assert!(!session.is_my_turn());
        assert!(session.game_state().is_none());
        assert!(matches!(
            session.pickup(),
            Err(ActionError::NotConnected)
        ));
    }
}
