//! Pure rules engine for Splash.
//!
//! No I/O, no clocks, no randomness beyond the deck shuffle: every
//! function here is a plain transition over a [`GameState`] snapshot.
//! Legality is computed entirely client-side; the relay never calls
//! into this crate. Any two clients applying the same action to the
//! same snapshot must reach identical states.

mod deck;
mod engine;
mod error;

pub use deck::{build_deck, DECK_SIZE, JOKER_COUNT};
pub use engine::{
    apply_pickup, apply_play, can_play_on_top, deal_new_game, new_game, validate_selection,
    Selection, HAND_SIZE, MAX_PLAYERS,
};
pub use error::{DealError, PlayError};
