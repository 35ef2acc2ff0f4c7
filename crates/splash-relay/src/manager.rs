//! Room manager: lazily creates and tracks one actor per room code.

use std::collections::HashMap;

use crate::room::spawn_room;
use crate::RoomHandle;

/// Normalizes a raw room code: trimmed and uppercased.
///
/// `beach` and `BEACH` select the same actor. Returns `None` for
/// blank codes.
pub fn normalize_room_code(raw: &str) -> Option<String> {
    let code = raw.trim();
    if code.is_empty() {
        None
    } else {
        Some(code.to_uppercase())
    }
}

/// Tracks all live room actors, keyed by normalized room code.
///
/// Rooms hold state only in memory; an evicted manager takes every
/// roster and snapshot with it.
#[derive(Default)]
pub struct RoomManager {
    rooms: HashMap<String, RoomHandle>,
}

impl RoomManager {
    /// Creates a new, empty room manager.
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
        }
    }

    /// Returns the actor for a normalized code, spawning it on first
    /// reference.
    pub fn room(&mut self, code: &str) -> RoomHandle {
        if let Some(handle) = self.rooms.get(code) {
            return handle.clone();
        }
        let handle = spawn_room(code.to_string());
        self.rooms.insert(code.to_string(), handle.clone());
        tracing::info!(room = %code, "room created");
        handle
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// All live room codes.
    pub fn room_codes(&self) -> Vec<String> {
        self.rooms.keys().cloned().collect()
    }
}
