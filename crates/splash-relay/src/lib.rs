//! The Splash relay: one actor per room, gatekeeping by identity only.
//!
//! The relay never validates game rules and does not depend on the
//! rules crate. It checks *who* may submit a snapshot (the host for
//! `START`, the current-turn seat for `UPDATE`), stores whatever it
//! accepted verbatim, and fans it out to every connected socket. All
//! rule correctness lives client-side.

mod error;
mod manager;
mod room;
mod server;

pub use error::RelayError;
pub use manager::{normalize_room_code, RoomManager};
pub use room::{spawn_room, ClientSender, RoomHandle};
pub use server::RelayServer;

use std::fmt;

/// Opaque identifier for one accepted socket.
///
/// Distinct from the client-chosen identity token carried in `join`:
/// a client that reconnects gets a new `ConnectionId` but keeps its
/// token (and therefore its seat).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}
