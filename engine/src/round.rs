use crate::{Hand, Shoe};
use parlor_types::{Amount, BalanceAction, Card};
use thiserror::Error;

/// Terminal classification of a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Player beat the dealer (or the dealer busted). Pays 2x the bet.
    Win,
    /// Player natural against a dealer non-natural. Pays 2.5x the bet.
    Blackjack,
    /// Dealer won or the player busted. The bet is already gone.
    Lose,
    /// Tie; the bet is refunded.
    Push,
}

impl Outcome {
    /// The balance mutation this outcome settles with.
    pub fn action(self) -> BalanceAction {
        match self {
            Outcome::Win => BalanceAction::Win,
            Outcome::Blackjack => BalanceAction::Blackjack,
            Outcome::Lose => BalanceAction::Lose,
            Outcome::Push => BalanceAction::Push,
        }
    }
}

/// Where the round currently stands.
///
/// `Idle` is the absence of a `Round`; the `Idle -> Dealt` transition is
/// [`Round::deal`], and `Dealt` itself is transient because the blackjack
/// check runs before `deal` returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    PlayerTurn,
    DealerTurn,
    Resolved(Outcome),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoundError {
    #[error("a round requires a positive bet")]
    NoBet,
    #[error("action not allowed in the current phase")]
    OutOfTurn,
    #[error("shoe exhausted")]
    ShoeExhausted,
}

/// One step of the dealer's auto-play.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DealerStep {
    /// Dealer was under 17 and drew. More steps remain.
    Drew(Card),
    /// Dealer stands (or busted); the round is resolved.
    Done(Outcome),
}

/// A single blackjack round: both hands, the frozen bet, and the phase.
///
/// The dealer's second card is dealt face-down at the start and only
/// revealed by the blackjack check or by `stand`; the dealer never draws
/// an extra card just to be checked.
#[derive(Clone, Debug)]
pub struct Round {
    bet: Amount,
    player: Hand,
    dealer: Hand,
    hole_revealed: bool,
    phase: Phase,
}

impl Round {
    /// Deal a new round: player two up, dealer one up and one hole, then
    /// the immediate blackjack check.
    ///
    /// The bet is immutable from here on. Fails with [`RoundError::NoBet`]
    /// when nothing is wagered.
    pub fn deal(bet: Amount, shoe: &mut Shoe) -> Result<Self, RoundError> {
        if !bet.is_positive() {
            return Err(RoundError::NoBet);
        }

        let mut player = Hand::new();
        let mut dealer = Hand::new();
        player.push(shoe.deal().ok_or(RoundError::ShoeExhausted)?);
        dealer.push(shoe.deal().ok_or(RoundError::ShoeExhausted)?);
        player.push(shoe.deal().ok_or(RoundError::ShoeExhausted)?);
        dealer.push(shoe.deal().ok_or(RoundError::ShoeExhausted)?);

        let mut round = Self {
            bet,
            player,
            dealer,
            hole_revealed: false,
            phase: Phase::PlayerTurn,
        };
        round.blackjack_check();
        Ok(round)
    }

    /// Player blackjack beats everything but a dealer natural (push);
    /// a dealer natural against a non-natural player ends the round
    /// immediately as a loss.
    fn blackjack_check(&mut self) {
        if self.player.is_blackjack() {
            self.hole_revealed = true;
            let outcome = if self.dealer.total() == 21 {
                Outcome::Push
            } else {
                Outcome::Blackjack
            };
            self.phase = Phase::Resolved(outcome);
        } else if self.dealer.is_blackjack() {
            self.hole_revealed = true;
            self.phase = Phase::Resolved(Outcome::Lose);
        }
    }

    /// Draw one more card for the player. Busting resolves the round as a
    /// loss with no dealer turn.
    pub fn hit(&mut self, shoe: &mut Shoe) -> Result<u8, RoundError> {
        if self.phase != Phase::PlayerTurn {
            return Err(RoundError::OutOfTurn);
        }
        let card = shoe.deal().ok_or(RoundError::ShoeExhausted)?;
        self.player.push(card);
        let total = self.player.total();
        if total > 21 {
            self.phase = Phase::Resolved(Outcome::Lose);
        }
        Ok(total)
    }

    /// End the player's turn: reveal the hole card and hand control to
    /// the dealer.
    pub fn stand(&mut self) -> Result<(), RoundError> {
        if self.phase != Phase::PlayerTurn {
            return Err(RoundError::OutOfTurn);
        }
        self.hole_revealed = true;
        self.phase = Phase::DealerTurn;
        Ok(())
    }

    /// Advance the dealer by one decision: draw while under 17, otherwise
    /// stand and resolve by comparison. One card per call so the caller
    /// can pace the reveals.
    pub fn dealer_step(&mut self, shoe: &mut Shoe) -> Result<DealerStep, RoundError> {
        if self.phase != Phase::DealerTurn {
            return Err(RoundError::OutOfTurn);
        }
        if self.dealer.total() < 17 {
            let card = shoe.deal().ok_or(RoundError::ShoeExhausted)?;
            self.dealer.push(card);
            return Ok(DealerStep::Drew(card));
        }

        let dealer = self.dealer.total();
        let player = self.player.total();
        let outcome = if dealer > 21 {
            Outcome::Win
        } else if dealer > player {
            Outcome::Lose
        } else if dealer < player {
            Outcome::Win
        } else {
            Outcome::Push
        };
        self.phase = Phase::Resolved(outcome);
        Ok(DealerStep::Done(outcome))
    }

    pub fn bet(&self) -> Amount {
        self.bet
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            Phase::Resolved(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn player(&self) -> &Hand {
        &self.player
    }

    pub fn player_total(&self) -> u8 {
        self.player.total()
    }

    pub fn dealer(&self) -> &Hand {
        &self.dealer
    }

    pub fn hole_revealed(&self) -> bool {
        self.hole_revealed
    }

    /// The dealer cards a player may see: the upcard alone until the hole
    /// is revealed, then everything.
    pub fn dealer_visible(&self) -> &[Card] {
        if self.hole_revealed {
            self.dealer.cards()
        } else {
            &self.dealer.cards()[..1]
        }
    }

    pub fn dealer_visible_total(&self) -> u8 {
        let mut shown = Hand::new();
        for &card in self.dealer_visible() {
            shown.push(card);
        }
        shown.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlor_types::{Rank, Suit};

    fn card(rank: Rank) -> Card {
        Card {
            suit: Suit::Clubs,
            rank,
            deck: 0,
        }
    }

    /// Shoe dealing the given ranks in order:
    /// player, dealer up, player, dealer hole, then hits/draws.
    fn shoe_of(ranks: &[Rank]) -> Shoe {
        let cards = ranks.iter().rev().map(|&rank| card(rank)).collect();
        Shoe::stacked(cards)
    }

    fn bet() -> Amount {
        Amount::from_dollars(25)
    }

    #[test]
    fn deal_requires_a_bet() {
        let mut shoe = shoe_of(&[Rank::Two; 8]);
        assert_eq!(
            Round::deal(Amount::ZERO, &mut shoe).unwrap_err(),
            RoundError::NoBet
        );
    }

    #[test]
    fn player_natural_beats_dealer_nineteen() {
        // Player A,K; dealer 10 up, 9 hole.
        let mut shoe = shoe_of(&[Rank::Ace, Rank::Ten, Rank::King, Rank::Nine]);
        let round = Round::deal(bet(), &mut shoe).unwrap();
        assert_eq!(round.outcome(), Some(Outcome::Blackjack));
        assert_eq!(round.outcome().unwrap().action(), BalanceAction::Blackjack);
        assert!(round.hole_revealed());
    }

    #[test]
    fn simultaneous_naturals_push() {
        // Player A,K; dealer A up, K hole.
        let mut shoe = shoe_of(&[Rank::Ace, Rank::Ace, Rank::King, Rank::King]);
        let round = Round::deal(bet(), &mut shoe).unwrap();
        assert_eq!(round.outcome(), Some(Outcome::Push));
    }

    #[test]
    fn dealer_natural_ends_the_round_without_a_player_turn() {
        // Player 10,9; dealer A up, Q hole.
        let mut shoe = shoe_of(&[Rank::Ten, Rank::Ace, Rank::Nine, Rank::Queen]);
        let mut round = Round::deal(bet(), &mut shoe).unwrap();
        assert_eq!(round.outcome(), Some(Outcome::Lose));
        assert!(round.hole_revealed());
        assert_eq!(round.hit(&mut shoe).unwrap_err(), RoundError::OutOfTurn);
    }

    #[test]
    fn hole_card_stays_hidden_during_the_player_turn() {
        // Player 10,9; dealer 10 up, 7 hole.
        let mut shoe = shoe_of(&[Rank::Ten, Rank::Ten, Rank::Nine, Rank::Seven]);
        let round = Round::deal(bet(), &mut shoe).unwrap();
        assert_eq!(round.phase(), Phase::PlayerTurn);
        assert_eq!(round.dealer_visible().len(), 1);
        assert_eq!(round.dealer_visible_total(), 10);
        assert_eq!(round.dealer().total(), 17);
    }

    #[test]
    fn bust_resolves_immediately_with_no_dealer_turn() {
        // Player 10,9 then hits a 4 (23); dealer 5 up, 6 hole.
        let mut shoe = shoe_of(&[Rank::Ten, Rank::Five, Rank::Nine, Rank::Six, Rank::Four]);
        let mut round = Round::deal(bet(), &mut shoe).unwrap();
        assert_eq!(round.hit(&mut shoe).unwrap(), 23);
        assert_eq!(round.outcome(), Some(Outcome::Lose));
        assert_eq!(
            round.dealer_step(&mut shoe).unwrap_err(),
            RoundError::OutOfTurn
        );
        // Dealer never drew past the hole card.
        assert_eq!(round.dealer().len(), 2);
    }

    #[test]
    fn dealer_draws_to_seventeen_then_busts() {
        // Player 10,10 stands on 20; dealer 10 up, 2 hole, draws 4 (16)
        // then 6 (22) and busts.
        let mut shoe = shoe_of(&[
            Rank::Ten,
            Rank::Ten,
            Rank::Ten,
            Rank::Two,
            Rank::Four,
            Rank::Six,
        ]);
        let mut round = Round::deal(bet(), &mut shoe).unwrap();
        round.stand().unwrap();
        assert!(round.hole_revealed());

        assert!(matches!(
            round.dealer_step(&mut shoe).unwrap(),
            DealerStep::Drew(_)
        ));
        assert!(matches!(
            round.dealer_step(&mut shoe).unwrap(),
            DealerStep::Drew(_)
        ));
        assert_eq!(
            round.dealer_step(&mut shoe).unwrap(),
            DealerStep::Done(Outcome::Win)
        );
        assert_eq!(round.dealer().total(), 22);
    }

    #[test]
    fn dealer_stands_on_seventeen_and_loses_to_twenty() {
        // Player 10,10; dealer 10 up, 7 hole: stands at 17.
        let mut shoe = shoe_of(&[Rank::Ten, Rank::Ten, Rank::Ten, Rank::Seven]);
        let mut round = Round::deal(bet(), &mut shoe).unwrap();
        round.stand().unwrap();
        assert_eq!(
            round.dealer_step(&mut shoe).unwrap(),
            DealerStep::Done(Outcome::Win)
        );
    }

    #[test]
    fn equal_totals_push() {
        // Player 10,9 stands on 19; dealer 10 up, 9 hole stands on 19.
        let mut shoe = shoe_of(&[Rank::Ten, Rank::Ten, Rank::Nine, Rank::Nine]);
        let mut round = Round::deal(bet(), &mut shoe).unwrap();
        round.stand().unwrap();
        assert_eq!(
            round.dealer_step(&mut shoe).unwrap(),
            DealerStep::Done(Outcome::Push)
        );
    }

    #[test]
    fn dealer_nineteen_beats_player_eighteen() {
        // Player 10,8; dealer 10 up, 9 hole.
        let mut shoe = shoe_of(&[Rank::Ten, Rank::Ten, Rank::Eight, Rank::Nine]);
        let mut round = Round::deal(bet(), &mut shoe).unwrap();
        round.stand().unwrap();
        assert_eq!(
            round.dealer_step(&mut shoe).unwrap(),
            DealerStep::Done(Outcome::Lose)
        );
    }

    #[test]
    fn three_card_twenty_one_is_not_a_natural() {
        // Player 7,7 hits 7 (21, no blackjack payout); dealer 10 up, 8 hole.
        let mut shoe = shoe_of(&[
            Rank::Seven,
            Rank::Ten,
            Rank::Seven,
            Rank::Eight,
            Rank::Seven,
        ]);
        let mut round = Round::deal(bet(), &mut shoe).unwrap();
        assert_eq!(round.hit(&mut shoe).unwrap(), 21);
        round.stand().unwrap();
        assert_eq!(
            round.dealer_step(&mut shoe).unwrap(),
            DealerStep::Done(Outcome::Win)
        );
        assert_ne!(round.outcome(), Some(Outcome::Blackjack));
    }

    #[test]
    fn guards_reject_out_of_phase_input() {
        let mut shoe = shoe_of(&[Rank::Ten, Rank::Ten, Rank::Nine, Rank::Seven, Rank::Two]);
        let mut round = Round::deal(bet(), &mut shoe).unwrap();
        round.stand().unwrap();
        assert_eq!(round.hit(&mut shoe).unwrap_err(), RoundError::OutOfTurn);
        assert_eq!(round.stand().unwrap_err(), RoundError::OutOfTurn);
    }

    #[test]
    fn exhausted_shoe_fails_closed() {
        let mut shoe = shoe_of(&[Rank::Ten, Rank::Ten]);
        assert_eq!(
            Round::deal(bet(), &mut shoe).unwrap_err(),
            RoundError::ShoeExhausted
        );
    }
}
