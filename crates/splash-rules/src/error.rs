//! Error types for rule violations.
//!
//! Violations are ordinary values returned to the caller, never panics,
//! and never cross the network: a client that fails validation simply
//! has nothing to submit.

/// A named failure from selection validation or a pickup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PlayError {
    /// The acting seat does not exist in this state.
    #[error("no player at that seat")]
    NoPlayer,

    /// The acting seat is not the current player.
    #[error("not your turn")]
    NotYourTurn,

    /// The selection was empty.
    #[error("no cards selected")]
    Empty,

    /// None of the selected ids resolved to a card the player holds.
    #[error("no selected card found")]
    NotFound,

    /// The resolved cards do not share a single rank.
    #[error("selected cards mix ranks")]
    MixedRank,

    /// A table-up card was selected while the hand still has cards.
    #[error("hand must be played before table cards")]
    MustPlayHandFirst,

    /// The shared rank cannot be played on the current pile top.
    #[error("rank cannot be played on the pile")]
    Illegal,
}

/// A failure while dealing a new game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DealError {
    /// The roster is empty — there is no one to deal to.
    #[error("cannot deal to an empty roster")]
    EmptyRoster,

    /// More players than the deck can seat (19 cards each plus the
    /// pile seed).
    #[error("too many players: {0}")]
    TooManyPlayers(usize),

    /// The supplied deck is too small for this roster.
    #[error("deck has {available} cards, {required} required")]
    ShortDeck { required: usize, available: usize },
}
