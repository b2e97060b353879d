use parlor_types::Card;

/// The cards dealt to one participant this round.
#[derive(Clone, Debug, Default)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Hand total with aces downgraded from 11 to 1 one at a time while
    /// the total exceeds 21. Greedy is correct: each downgrade moves the
    /// total by exactly 10 and totals are re-checked after every card.
    pub fn total(&self) -> u8 {
        let mut total: u16 = 0;
        let mut aces: u8 = 0;
        for card in &self.cards {
            if card.is_ace() {
                aces += 1;
            }
            total += card.value() as u16;
        }
        while total > 21 && aces > 0 {
            total -= 10;
            aces -= 1;
        }
        total.min(u8::MAX as u16) as u8
    }

    pub fn is_bust(&self) -> bool {
        self.total() > 21
    }

    /// A natural: 21 from the first two cards.
    pub fn is_blackjack(&self) -> bool {
        self.cards.len() == 2 && self.total() == 21
    }
}
