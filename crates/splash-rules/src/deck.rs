//! Deck construction and shuffle.

use rand::seq::SliceRandom;

use splash_protocol::{Card, CardId, Rank, Suit};

/// Cards in a full Splash deck: two 52-card decks plus four jokers.
pub const DECK_SIZE: usize = 108;

/// Number of jokers in the deck.
pub const JOKER_COUNT: usize = 4;

/// Builds and shuffles a full 108-card deck.
///
/// Deterministic in composition only: two copies of each standard card
/// plus four jokers, every card with a unique id token. Order is a
/// uniform Fisher–Yates shuffle.
pub fn build_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(DECK_SIZE);
    for copy in 1..=2 {
        for suit in Suit::STANDARD {
            for rank in Rank::STANDARD {
                deck.push(Card {
                    id: CardId(format!("{rank}{suit}#{copy}")),
                    rank,
                    suit,
                });
            }
        }
    }
    for copy in 1..=JOKER_COUNT {
        deck.push(Card {
            id: CardId(format!("JOKER★#{copy}")),
            rank: Rank::Joker,
            suit: Suit::Wild,
        });
    }

    deck.shuffle(&mut rand::rng());
    deck
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_deck_has_108_cards() {
        assert_eq!(build_deck().len(), DECK_SIZE);
    }

    #[test]
    fn test_deck_composition() {
        let deck = build_deck();
        let jokers = deck.iter().filter(|c| c.rank == Rank::Joker).count();
        assert_eq!(jokers, JOKER_COUNT);
        assert_eq!(deck.len() - jokers, 104);

        // Exactly two copies of every standard rank-suit pair.
        for suit in Suit::STANDARD {
            for rank in Rank::STANDARD {
                let copies = deck
                    .iter()
                    .filter(|c| c.rank == rank && c.suit == suit)
                    .count();
                assert_eq!(copies, 2, "{rank}{suit}");
            }
        }
    }

    #[test]
    fn test_deck_ids_are_unique() {
        let deck = build_deck();
        let ids: HashSet<_> = deck.iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids.len(), DECK_SIZE);
    }

    #[test]
    fn test_jokers_carry_wild_suit() {
        let deck = build_deck();
        for card in deck.iter().filter(|c| c.rank == Rank::Joker) {
            assert_eq!(card.suit, Suit::Wild);
        }
    }
}
