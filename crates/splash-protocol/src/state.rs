//! The replicated game state model.
//!
//! These types travel inside `action` and `state` messages as one whole
//! snapshot. The protocol is "last writer wins, full snapshot": a
//! `GameState` is always replaced wholesale, never merged field by field,
//! so every type here is plain data with no interior bookkeeping.
//!
//! Field names are serialized in camelCase — the wire format predates
//! this implementation and is shared with non-Rust clients.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of face-up (and face-down) table slots each player is dealt.
pub const TABLE_SLOTS: usize = 4;

/// Default display emoji assigned by seat when a skeleton state is built
/// before any deal has happened.
pub const DEFAULT_EMOJI: [&str; 5] = ["🌊", "🐬", "🦀", "🐙", "🐚"];

// ---------------------------------------------------------------------------
// Rank
// ---------------------------------------------------------------------------

/// A card rank.
///
/// The wire strings (`"A"`, `"2"` … `"10"`, `"J"`, `"Q"`, `"K"`,
/// `"JOKER"`) match the shared protocol exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    #[serde(rename = "A")]
    Ace,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5")]
    Five,
    #[serde(rename = "6")]
    Six,
    #[serde(rename = "7")]
    Seven,
    #[serde(rename = "8")]
    Eight,
    #[serde(rename = "9")]
    Nine,
    #[serde(rename = "10")]
    Ten,
    #[serde(rename = "J")]
    Jack,
    #[serde(rename = "Q")]
    Queen,
    #[serde(rename = "K")]
    King,
    #[serde(rename = "JOKER")]
    Joker,
}

impl Rank {
    /// The thirteen standard ranks, in stacking order (ace lowest).
    pub const STANDARD: [Rank; 13] = [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ];

    /// Returns `true` for the wild ranks (10 and JOKER) that clear the
    /// pile when played.
    pub fn is_wild(self) -> bool {
        matches!(self, Rank::Ten | Rank::Joker)
    }

    /// Returns `true` for the face ranks (J, Q, K).
    pub fn is_face(self) -> bool {
        matches!(self, Rank::Jack | Rank::Queen | Rank::King)
    }

    /// Position in the fixed stacking order A,2,…,10,J,Q,K.
    ///
    /// `None` for JOKER, which sits outside the order entirely (it is
    /// always wild).
    pub fn order_index(self) -> Option<u8> {
        Rank::STANDARD
            .iter()
            .position(|r| *r == self)
            .map(|i| i as u8)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rank::Ace => "A",
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Joker => "JOKER",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Suit
// ---------------------------------------------------------------------------

/// A card suit. Jokers carry the wild suit `★`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Suit {
    #[serde(rename = "♠")]
    Spades,
    #[serde(rename = "♥")]
    Hearts,
    #[serde(rename = "♦")]
    Diamonds,
    #[serde(rename = "♣")]
    Clubs,
    #[serde(rename = "★")]
    Wild,
}

impl Suit {
    /// The four standard suits.
    pub const STANDARD: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Suit::Spades => "♠",
            Suit::Hearts => "♥",
            Suit::Diamonds => "♦",
            Suit::Clubs => "♣",
            Suit::Wild => "★",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Card
// ---------------------------------------------------------------------------

/// An opaque, unique card identity token.
///
/// Created once at deck-build time and unchanged for the life of a game.
/// Selections reference cards by this token, so it must stay unique
/// across both copies of each standard card.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub String);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single card. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub rank: Rank,
    pub suit: Suit,
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

// ---------------------------------------------------------------------------
// PlayerState
// ---------------------------------------------------------------------------

/// One seat's cards and display identity within a [`GameState`].
///
/// `table_down` is dealt but consumed by no transition: it is a reserve
/// the traced game design never reaches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub name: String,
    pub emoji: String,
    /// Ordered hand; played cards are removed by id.
    pub hand: Vec<Card>,
    /// Face-up reserve, playable only once the hand is empty.
    pub table_up: [Option<Card>; TABLE_SLOTS],
    /// Face-down reserve, dealt and never touched again.
    pub table_down: [Option<Card>; TABLE_SLOTS],
}

impl PlayerState {
    /// Creates a seat with the given display identity and no cards.
    pub fn new(name: impl Into<String>, emoji: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            emoji: emoji.into(),
            hand: Vec::new(),
            table_up: [None, None, None, None],
            table_down: [None, None, None, None],
        }
    }

    /// Number of cards this player holds across all three zones.
    pub fn card_count(&self) -> usize {
        self.hand.len()
            + self.table_up.iter().flatten().count()
            + self.table_down.iter().flatten().count()
    }
}

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

/// The single authoritative snapshot, replaced wholesale on every
/// broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Seats in order; index = seat.
    pub players: Vec<PlayerState>,
    /// Undealt remainder of the deck after a deal.
    pub deck: Vec<Card>,
    /// Permanently cleared pile contents; never reenters play.
    pub discard: Vec<Card>,
    /// The active face-up stack; top = last element.
    pub pile: Vec<Card>,
    /// Seat whose turn it is. Always a valid index into `players`.
    pub current_player: usize,
    /// True immediately after a clear: the next play may be any rank.
    pub must_play_any: bool,
}

impl GameState {
    /// Builds an empty skeleton sized by a roster, with default per-seat
    /// display assets and no cards anywhere.
    ///
    /// Used client-side so the presentation layer has seats to render
    /// before the host deals.
    pub fn skeleton(roster: &[Identity]) -> Self {
        // players is indexed by seat, and seats can have gaps when a
        // player is away; vacant seats get unnamed empty entries.
        let seat_count = roster.iter().map(|p| p.seat + 1).max().unwrap_or(0);
        let mut players: Vec<PlayerState> = (0..seat_count)
            .map(|seat| PlayerState::new("", DEFAULT_EMOJI[seat % DEFAULT_EMOJI.len()]))
            .collect();
        for p in roster {
            players[p.seat].name = p.name.clone();
        }
        Self {
            players,
            deck: Vec::new(),
            discard: Vec::new(),
            pile: Vec::new(),
            current_player: 0,
            must_play_any: false,
        }
    }

    /// Total number of cards across deck, discard, pile, and every
    /// player zone. Invariantly 108 after a deal.
    pub fn card_count(&self) -> usize {
        self.deck.len()
            + self.discard.len()
            + self.pile.len()
            + self.players.iter().map(PlayerState::card_count).sum::<usize>()
    }

    /// Rank of the top-of-pile card, if any.
    pub fn top_rank(&self) -> Option<Rank> {
        self.pile.last().map(|c| c.rank)
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A roster entry: one *connection* identity, distinct from a seat's
/// [`PlayerState`].
///
/// Seats are assigned in join order and never reassigned, so a roster
/// update may change a player's `name` but must never touch any card
/// zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Client-generated connection token.
    pub id: String,
    pub name: String,
    pub seat: usize,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_wire_strings() {
        assert_eq!(serde_json::to_string(&Rank::Ace).unwrap(), "\"A\"");
        assert_eq!(serde_json::to_string(&Rank::Ten).unwrap(), "\"10\"");
        assert_eq!(serde_json::to_string(&Rank::Joker).unwrap(), "\"JOKER\"");
        let r: Rank = serde_json::from_str("\"Q\"").unwrap();
        assert_eq!(r, Rank::Queen);
    }

    #[test]
    fn test_rank_order_index() {
        assert_eq!(Rank::Ace.order_index(), Some(0));
        assert_eq!(Rank::Nine.order_index(), Some(8));
        assert_eq!(Rank::King.order_index(), Some(12));
        assert_eq!(Rank::Joker.order_index(), None);
    }

    #[test]
    fn test_rank_wild_and_face() {
        assert!(Rank::Ten.is_wild());
        assert!(Rank::Joker.is_wild());
        assert!(!Rank::Nine.is_wild());

        assert!(Rank::Jack.is_face());
        assert!(Rank::Queen.is_face());
        assert!(Rank::King.is_face());
        assert!(!Rank::Ten.is_face());
        assert!(!Rank::Ace.is_face());
    }

    #[test]
    fn test_card_id_serializes_as_plain_string() {
        let id = CardId("A♠#1".into());
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"A♠#1\"");
    }

    #[test]
    fn test_player_state_wire_field_names() {
        let json = serde_json::to_value(PlayerState::new("maya", "🌊")).unwrap();
        assert!(json.get("tableUp").is_some());
        assert!(json.get("tableDown").is_some());
        assert!(json.get("table_up").is_none());
        assert_eq!(json["tableUp"], serde_json::json!([null, null, null, null]));
    }

    #[test]
    fn test_game_state_wire_field_names() {
        let state = GameState::skeleton(&[]);
        let json = serde_json::to_value(&state).unwrap();
        assert!(json.get("currentPlayer").is_some());
        assert!(json.get("mustPlayAny").is_some());
        assert!(json.get("current_player").is_none());
    }

    #[test]
    fn test_skeleton_sizes_from_roster() {
        let roster = vec![
            Identity { id: "b".into(), name: "bo".into(), seat: 1 },
            Identity { id: "a".into(), name: "ana".into(), seat: 0 },
        ];
        let state = GameState::skeleton(&roster);
        assert_eq!(state.players.len(), 2);
        // Ordered by seat, not roster order.
        assert_eq!(state.players[0].name, "ana");
        assert_eq!(state.players[1].name, "bo");
        assert_eq!(state.card_count(), 0);
        assert_eq!(state.current_player, 0);
        assert!(!state.must_play_any);
    }

    #[test]
    fn test_skeleton_pads_vacant_seats() {
        let roster = vec![
            Identity { id: "a".into(), name: "ana".into(), seat: 0 },
            Identity { id: "c".into(), name: "cam".into(), seat: 2 },
        ];
        let state = GameState::skeleton(&roster);
        assert_eq!(state.players.len(), 3);
        assert_eq!(state.players[0].name, "ana");
        assert_eq!(state.players[1].name, "");
        assert_eq!(state.players[2].name, "cam");
    }

    #[test]
    fn test_skeleton_assigns_default_emoji_by_seat() {
        let roster = vec![
            Identity { id: "a".into(), name: "ana".into(), seat: 0 },
            Identity { id: "b".into(), name: "bo".into(), seat: 1 },
        ];
        let state = GameState::skeleton(&roster);
        assert_eq!(state.players[0].emoji, DEFAULT_EMOJI[0]);
        assert_eq!(state.players[1].emoji, DEFAULT_EMOJI[1]);
    }

    #[test]
    fn test_top_rank_empty_and_nonempty() {
        let mut state = GameState::skeleton(&[]);
        assert_eq!(state.top_rank(), None);
        state.pile.push(Card {
            id: CardId("9♦#1".into()),
            rank: Rank::Nine,
            suit: Suit::Diamonds,
        });
        assert_eq!(state.top_rank(), Some(Rank::Nine));
    }

    #[test]
    fn test_game_state_round_trip() {
        let mut state = GameState::skeleton(&[Identity {
            id: "a".into(),
            name: "ana".into(),
            seat: 0,
        }]);
        state.players[0].hand.push(Card {
            id: CardId("K♣#2".into()),
            rank: Rank::King,
            suit: Suit::Clubs,
        });
        state.must_play_any = true;
        let bytes = serde_json::to_vec(&state).unwrap();
        let decoded: GameState = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(state, decoded);
    }
}
