use parlor_types::{Card, Rank, Suit};
use rand::seq::SliceRandom;
use rand::Rng;

/// A shuffled multi-deck stack of cards, dealt from the end.
///
/// One shoe serves a whole table session; the orchestrator rebuilds it
/// between rounds once it runs low rather than reshuffling mid-round.
#[derive(Clone, Debug)]
pub struct Shoe {
    cards: Vec<Card>,
}

impl Shoe {
    /// Decks used by the table.
    pub const STANDARD_DECKS: u8 = 4;

    /// Build `decks` concatenated 52-card decks and uniformly permute
    /// them (Fisher-Yates via `SliceRandom`).
    pub fn new(decks: u8, rng: &mut impl Rng) -> Self {
        let mut cards = Vec::with_capacity(decks as usize * 52);
        for deck in 0..decks {
            for suit in Suit::ALL {
                for rank in Rank::ALL {
                    cards.push(Card { suit, rank, deck });
                }
            }
        }
        cards.shuffle(rng);
        Self { cards }
    }

    /// A shoe with a known order, dealt last-element-first. Useful for
    /// exercising specific deals.
    pub fn stacked(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    /// Deal the next card, or `None` when exhausted.
    pub fn deal(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }
}
