//! Wire protocol and shared data model for Splash.
//!
//! Everything the client and relay exchange lives here: the card/game
//! state model, the JSON message shapes, and the codec that turns them
//! into bytes. The relay treats `GameState` as an opaque blob it stores
//! and fans out verbatim — only the client-side rules engine
//! (`splash-rules`) ever interprets it.

mod codec;
mod error;
mod message;
mod state;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use message::{ActionKind, ClientMessage, GameAction, ServerMessage, StatePayload};
pub use state::{
    Card, CardId, GameState, Identity, PlayerState, Rank, Suit, DEFAULT_EMOJI, TABLE_SLOTS,
};
