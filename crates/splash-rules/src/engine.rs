//! Deals, the legality predicate, and the play/pickup transitions.

use splash_protocol::{
    Card, CardId, GameState, Identity, PlayerState, Rank, DEFAULT_EMOJI, TABLE_SLOTS,
};

use crate::deck::build_deck;
use crate::error::{DealError, PlayError};

/// Cards dealt to each player's hand.
pub const HAND_SIZE: usize = 11;

/// Maximum seats a 108-card deck can supply: 19 cards per player plus
/// the pile seed.
pub const MAX_PLAYERS: usize = 5;

// ---------------------------------------------------------------------------
// Dealing
// ---------------------------------------------------------------------------

/// Deals a fresh game for the roster, consuming from the deck's tail.
///
/// Deal order is fixed: 4 cards per player to `tableDown`, then 4 per
/// player to `tableUp`, then 11 per player to hand, each round
/// proceeding round-robin by seat. One final card is popped to seed
/// the pile; a wild seed (10 or JOKER) is treated as an immediate
/// clearing play — moved to discard with `mustPlayAny` set.
///
/// `players` is indexed by seat number, so the state is sized to the
/// roster's highest seat. Relay seats are stable across disconnects,
/// which means a roster can legitimately have gaps; seats missing from
/// the roster exist as empty entries and are dealt nothing.
///
/// The host (seat 0) is the only client that may submit the result as a
/// starting snapshot; that authority lives in the session and relay
/// layers, not here.
pub fn deal_new_game(roster: &[Identity], mut deck: Vec<Card>) -> Result<GameState, DealError> {
    if roster.is_empty() {
        return Err(DealError::EmptyRoster);
    }
    let mut seats: Vec<usize> = roster.iter().map(|p| p.seat).collect();
    seats.sort_unstable();
    seats.dedup();
    if seats.len() > MAX_PLAYERS {
        return Err(DealError::TooManyPlayers(seats.len()));
    }
    let required = seats.len() * (2 * TABLE_SLOTS + HAND_SIZE) + 1;
    if deck.len() < required {
        return Err(DealError::ShortDeck {
            required,
            available: deck.len(),
        });
    }

    // Roster is non-empty, so a highest seat exists.
    let seat_count = seats.last().copied().unwrap_or(0) + 1;
    let mut players: Vec<PlayerState> = (0..seat_count)
        .map(|seat| PlayerState::new("", DEFAULT_EMOJI[seat % DEFAULT_EMOJI.len()]))
        .collect();
    for p in roster {
        players[p.seat].name = p.name.clone();
    }

    // Deck size was checked above, so every draw below succeeds.
    let mut draw = || deck.pop().expect("deck size checked before dealing");

    for slot in 0..TABLE_SLOTS {
        for &seat in &seats {
            players[seat].table_down[slot] = Some(draw());
        }
    }
    for slot in 0..TABLE_SLOTS {
        for &seat in &seats {
            players[seat].table_up[slot] = Some(draw());
        }
    }
    for _ in 0..HAND_SIZE {
        for &seat in &seats {
            players[seat].hand.push(draw());
        }
    }

    let seed = draw();
    let mut state = GameState {
        players,
        deck,
        discard: Vec::new(),
        pile: Vec::new(),
        current_player: 0,
        must_play_any: false,
    };
    if seed.rank.is_wild() {
        // The seed clears itself straight to discard.
        state.discard.push(seed);
        state.must_play_any = true;
    } else {
        state.pile.push(seed);
    }
    Ok(state)
}

/// Builds a shuffled deck and deals it. Convenience over
/// [`deal_new_game`].
pub fn new_game(roster: &[Identity]) -> Result<GameState, DealError> {
    deal_new_game(roster, build_deck())
}

// ---------------------------------------------------------------------------
// Legality
// ---------------------------------------------------------------------------

/// The legality predicate: may `rank` be played on the current pile?
///
/// In order:
/// 1. anything is legal while `mustPlayAny` is set;
/// 2. anything is legal on an empty pile;
/// 3. 10 and JOKER are always legal (wild clear);
/// 4. nothing else lands on a wild top (the pile should already be
///    empty by clearing logic — safety branch);
/// 5. a face rank may not land on a non-face top (directional: a
///    non-face candidate on a face top falls through to rule 6);
/// 6. otherwise legal iff the rank's position in A,2,…,10,J,Q,K is at
///    most the top's.
pub fn can_play_on_top(state: &GameState, rank: Rank) -> bool {
    if state.must_play_any {
        return true;
    }
    let Some(top) = state.top_rank() else {
        return true;
    };
    if rank.is_wild() {
        return true;
    }
    if top.is_wild() {
        return false;
    }
    if rank.is_face() && !top.is_face() {
        return false;
    }
    match (rank.order_index(), top.order_index()) {
        (Some(candidate), Some(top)) => candidate <= top,
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Where a resolved card came from, so [`apply_play`] can remove it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CardSource {
    Hand,
    TableUp(usize),
}

#[derive(Debug, Clone, PartialEq)]
struct Pick {
    card: Card,
    source: CardSource,
}

/// A validated selection, ready to apply.
///
/// Only [`validate_selection`] constructs these, so an existing
/// `Selection` is proof the play was legal against the state it was
/// validated on. A fresh broadcast invalidates that proof — discard and
/// re-validate.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    rank: Rank,
    picks: Vec<Pick>,
}

impl Selection {
    /// The single rank every resolved card shares.
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// The resolved cards, in selection order.
    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.picks.iter().map(|p| &p.card)
    }

    /// Number of resolved cards.
    pub fn len(&self) -> usize {
        self.picks.len()
    }

    /// True when nothing resolved (never produced by validation).
    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }
}

/// Resolves selected card ids against the acting player's zones and
/// checks legality.
///
/// Ids resolve against the hand first; table-up cards are eligible only
/// while the hand is empty. Unknown ids are ignored, duplicates are
/// resolved once. All resolved cards must share one rank and that rank
/// must pass [`can_play_on_top`].
pub fn validate_selection(
    state: &GameState,
    acting_seat: usize,
    selected: &[CardId],
) -> Result<Selection, PlayError> {
    let player = state.players.get(acting_seat).ok_or(PlayError::NoPlayer)?;
    if acting_seat != state.current_player {
        return Err(PlayError::NotYourTurn);
    }
    if selected.is_empty() {
        return Err(PlayError::Empty);
    }

    let hand_empty = player.hand.is_empty();
    let mut picks: Vec<Pick> = Vec::with_capacity(selected.len());

    for id in selected {
        if picks.iter().any(|p| &p.card.id == id) {
            continue;
        }
        if let Some(card) = player.hand.iter().find(|c| &c.id == id) {
            picks.push(Pick {
                card: card.clone(),
                source: CardSource::Hand,
            });
        } else if let Some(slot) = player
            .table_up
            .iter()
            .position(|s| s.as_ref().is_some_and(|c| &c.id == id))
        {
            if !hand_empty {
                return Err(PlayError::MustPlayHandFirst);
            }
            let card = player.table_up[slot]
                .clone()
                .ok_or(PlayError::NotFound)?;
            picks.push(Pick {
                card,
                source: CardSource::TableUp(slot),
            });
        }
        // Unresolved ids are ignored.
    }

    if picks.is_empty() {
        return Err(PlayError::NotFound);
    }

    let rank = picks[0].card.rank;
    if picks.iter().any(|p| p.card.rank != rank) {
        return Err(PlayError::MixedRank);
    }
    if !can_play_on_top(state, rank) {
        return Err(PlayError::Illegal);
    }

    Ok(Selection { rank, picks })
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// Applies a validated selection to the state.
///
/// Resolved cards leave their source zones and land on the pile in
/// selection order. A wild rank, or a third same-rank card accumulating
/// on the pile, clears the pile to discard and leaves the turn with the
/// same player; any other play resets `mustPlayAny` and passes the turn
/// to the next seat still holding cards.
pub fn apply_play(state: &mut GameState, selection: Selection) {
    let seat = state.current_player;
    let Some(player) = state.players.get_mut(seat) else {
        return;
    };

    for pick in &selection.picks {
        match pick.source {
            CardSource::Hand => player.hand.retain(|c| c.id != pick.card.id),
            CardSource::TableUp(slot) => player.table_up[slot] = None,
        }
        state.pile.push(pick.card.clone());
    }

    if selection.rank.is_wild() {
        clear_pile(state);
        return;
    }

    let same_rank = state
        .pile
        .iter()
        .filter(|c| c.rank == selection.rank)
        .count();
    if same_rank >= 3 {
        clear_pile(state);
    } else {
        state.must_play_any = false;
        advance_turn(state);
    }
}

/// The acting player takes the whole pile into their hand (order
/// preserved); the turn passes and the next play may be any rank.
pub fn apply_pickup(state: &mut GameState, acting_seat: usize) -> Result<(), PlayError> {
    if acting_seat >= state.players.len() {
        return Err(PlayError::NoPlayer);
    }
    if acting_seat != state.current_player {
        return Err(PlayError::NotYourTurn);
    }

    let taken: Vec<Card> = state.pile.drain(..).collect();
    state.players[acting_seat].hand.extend(taken);
    state.must_play_any = true;
    advance_turn(state);
    Ok(())
}

/// Moves the entire pile to discard and sets `mustPlayAny`. The turn
/// does not advance: the clearing player plays again.
fn clear_pile(state: &mut GameState) {
    let cleared: Vec<Card> = state.pile.drain(..).collect();
    state.discard.extend(cleared);
    state.must_play_any = true;
}

/// Moves `currentPlayer` to the next seat still holding cards.
///
/// Seats with nothing left (shed out, or never dealt because the seat
/// was vacant at deal time) are skipped. If no seat holds any cards,
/// the turn moves one seat on unconditionally.
fn advance_turn(state: &mut GameState) {
    let n = state.players.len();
    if n == 0 {
        return;
    }
    for step in 1..=n {
        let seat = (state.current_player + step) % n;
        if state.players[seat].card_count() > 0 {
            state.current_player = seat;
            return;
        }
    }
    state.current_player = (state.current_player + 1) % n;
}

// =========================================================================
// Tests
// =========================================================================
