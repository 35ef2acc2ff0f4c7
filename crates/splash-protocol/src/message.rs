//! Message shapes for the client ↔ relay socket.
//!
//! JSON over a persistent bidirectional socket, lowercase `type` tags:
//!
//! | direction    | type      | payload                                  |
//! |--------------|-----------|------------------------------------------|
//! | client→relay | `join`    | `{id, name}`                             |
//! | relay→client | `welcome` | `{seat}`                                 |
//! | relay→all    | `players` | `{players: [{id, name, seat}]}`          |
//! | client→relay | `action`  | `{action: {type: START\|UPDATE, state}}` |
//! | relay→all    | `state`   | `{payload: {state}}`                     |
//! | client→relay | `ping`    | `{}`                                     |
//! | relay→client | `pong`    | `{}`                                     |
//!
//! Only successful state transitions ever cross the wire: there is no
//! error message in either direction. Authority violations are dropped
//! silently by the relay, and malformed JSON is discarded on receipt at
//! both ends.

use serde::{Deserialize, Serialize};

use crate::{GameState, Identity};

// ---------------------------------------------------------------------------
// Client → relay
// ---------------------------------------------------------------------------

/// Messages a client sends to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Announce identity and claim (or reclaim) a seat in the room.
    Join { id: String, name: String },
    /// Submit an authoritative snapshot for the relay to store and fan
    /// out. Gatekept by sender identity only — never by game rules.
    Action { action: GameAction },
    /// Keep-alive. The relay answers with [`ServerMessage::Pong`].
    Ping,
}

/// The snapshot submission carried inside an `action` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub state: GameState,
}

/// Which authority gate an action must pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    /// Accepted only from seat 0 (the host). Replaces any stored
    /// snapshot.
    Start,
    /// Accepted only from the seat matching the stored snapshot's
    /// `currentPlayer`. Rejected while no snapshot exists.
    Update,
}

// ---------------------------------------------------------------------------
// Relay → client
// ---------------------------------------------------------------------------

/// Messages the relay sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Sent to a joining socket alone: its assigned seat.
    Welcome { seat: usize },
    /// The live-socket-filtered roster, broadcast after every join and
    /// leave.
    Players { players: Vec<Identity> },
    /// The authoritative snapshot, broadcast after every accepted
    /// action (and sent to a late joiner alone when one is stored).
    State { payload: StatePayload },
    /// Keep-alive reply. No side effects.
    Pong,
}

/// Wrapper matching the wire nesting `{payload: {state: …}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatePayload {
    pub state: GameState,
}

// =========================================================================
// Tests
// =========================================================================
