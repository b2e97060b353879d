//! The timed blackjack table: wires the round engine to the balance
//! backend and paces the reveal of cards the way the table UI shows
//! them.
//!
//! The orchestrator owns the shoe, the chip stack, and the displayed
//! balance. Every pause is a named constant routed through [`Clock`] so
//! tests run without real time, and every UI-facing change is emitted as
//! a [`TableEvent`] for the embedding UI to drain.

use crate::chips::{ChipError, ChipStack};
use crate::{BalanceBackend, Result};
use parlor_engine::{DealerStep, Outcome, Phase, Round, RoundError, Shoe};
use parlor_types::{Amount, BalanceAction, Card};
use rand::Rng;
use std::time::Duration;

/// Pause between each card of the opening deal.
pub const DEAL_STEP: Duration = Duration::from_millis(500);
/// Pause before each dealer draw.
pub const DEALER_DRAW_DELAY: Duration = Duration::from_millis(1500);
/// Pause before the result banner.
pub const RESULT_DELAY: Duration = Duration::from_millis(1500);
/// Pause before the new-game controls unlock.
pub const CONTROLS_DELAY: Duration = Duration::from_millis(3000);
/// How long the empty-bet warning stays up.
pub const WARNING_DURATION: Duration = Duration::from_millis(1500);

/// Injectable time source.
#[allow(async_fn_in_trait)]
pub trait Clock {
    async fn sleep(&self, duration: Duration);
}

/// Real time via tokio.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// A UI-facing state change.
#[derive(Clone, Debug, PartialEq)]
pub enum TableEvent {
    /// The committed balance changed.
    Balance(Amount),
    /// Transient validation message, auto-dismissed after `duration`.
    Warning { message: String, duration: Duration },
    PlayerCard(Card),
    DealerCard(Card),
    /// The dealer's second card went down face-down.
    HoleDealt,
    HoleRevealed(Card),
    /// The round resolved; `message` is the banner text.
    Result { outcome: Outcome, message: String },
    /// A balance call failed; the displayed balance is unchanged.
    BackendError(String),
    /// The new-game controls are available again.
    ControlsUnlocked,
}

/// Drives one table session: bet building, the deal, player decisions,
/// the dealer's auto-play, and exactly one settlement per round.
pub struct Orchestrator<B, C, R> {
    backend: B,
    clock: C,
    rng: R,
    shoe: Shoe,
    round: Option<Round>,
    settled: bool,
    stack: ChipStack,
    balance: Amount,
    events: Vec<TableEvent>,
}

impl<B: BalanceBackend, C: Clock, R: Rng> Orchestrator<B, C, R> {
    /// Fetch the starting balance and shuffle a fresh shoe.
    pub async fn connect(backend: B, clock: C, mut rng: R) -> Result<Self> {
        let balance = backend.balance().await?;
        let shoe = Shoe::new(Shoe::STANDARD_DECKS, &mut rng);
        Ok(Self {
            backend,
            clock,
            rng,
            shoe,
            round: None,
            settled: false,
            stack: ChipStack::new(),
            balance,
            events: vec![TableEvent::Balance(balance)],
        })
    }

    /// Committed balance as of the last server response.
    pub fn balance(&self) -> Amount {
        self.balance
    }

    /// Balance still available for chips.
    pub fn available(&self) -> Amount {
        self.balance
            .checked_sub(self.stack.total())
            .unwrap_or(Amount::ZERO)
    }

    pub fn bet(&self) -> Amount {
        self.stack.total()
    }

    pub fn chips(&self) -> &ChipStack {
        &self.stack
    }

    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    pub fn phase(&self) -> Option<Phase> {
        self.round.as_ref().map(Round::phase)
    }

    /// Take the events accumulated since the last drain.
    pub fn drain_events(&mut self) -> Vec<TableEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn add_chip(&mut self, denomination: i64) -> std::result::Result<(), ChipError> {
        if self.round.is_some() {
            return Err(ChipError::BettingClosed);
        }
        self.stack.add(denomination, self.balance)
    }

    pub fn remove_chip(&mut self, index: usize) -> std::result::Result<Option<Amount>, ChipError> {
        if self.round.is_some() {
            return Err(ChipError::BettingClosed);
        }
        Ok(self.stack.remove(index))
    }

    /// Replace the stack with an all-in pseudo-chip.
    pub fn all_in(&mut self) -> std::result::Result<(), ChipError> {
        if self.round.is_some() {
            return Err(ChipError::BettingClosed);
        }
        self.stack.all_in(self.balance);
        Ok(())
    }

    /// Start a round: send the bet, deal, and run the blackjack check.
    ///
    /// An empty stack emits the transient warning and starts nothing. A
    /// failed bet mutation aborts the round with the chips intact, since
    /// settling a round the server never debited would desync the
    /// ledger.
    pub async fn play(&mut self) -> Result<()> {
        if self.round.is_some() {
            return Err(RoundError::OutOfTurn.into());
        }
        if self.stack.is_empty() {
            self.events.push(TableEvent::Warning {
                message: "You are not betting any chips!".to_string(),
                duration: WARNING_DURATION,
            });
            return Ok(());
        }

        let bet = self.stack.total();
        let balance = self.backend.update(bet, BalanceAction::Bet).await?;
        self.balance = balance;
        self.events.push(TableEvent::Balance(balance));

        let round = Round::deal(bet, &mut self.shoe)?;
        let player = [round.player().cards()[0], round.player().cards()[1]];
        let dealer_up = round.dealer().cards()[0];

        self.events.push(TableEvent::PlayerCard(player[0]));
        self.clock.sleep(DEAL_STEP).await;
        self.events.push(TableEvent::DealerCard(dealer_up));
        self.clock.sleep(DEAL_STEP).await;
        self.events.push(TableEvent::PlayerCard(player[1]));
        self.events.push(TableEvent::HoleDealt);

        if round.hole_revealed() {
            self.events
                .push(TableEvent::HoleRevealed(round.dealer().cards()[1]));
        }
        let phase = round.phase();
        self.round = Some(round);
        self.settled = false;

        if let Phase::Resolved(outcome) = phase {
            self.settle(outcome).await;
        }
        Ok(())
    }

    /// Draw one card. Busting resolves the round immediately.
    pub async fn hit(&mut self) -> Result<()> {
        let round = self.round.as_mut().ok_or(RoundError::OutOfTurn)?;
        round.hit(&mut self.shoe)?;
        if let Some(card) = round.player().cards().last().copied() {
            self.events.push(TableEvent::PlayerCard(card));
        }
        if let Phase::Resolved(outcome) = round.phase() {
            self.settle(outcome).await;
        }
        Ok(())
    }

    /// Stop drawing; reveal the hole and auto-play the dealer, one draw
    /// per [`DEALER_DRAW_DELAY`].
    pub async fn stand(&mut self) -> Result<()> {
        let round = self.round.as_mut().ok_or(RoundError::OutOfTurn)?;
        round.stand()?;
        let hole = round.dealer().cards()[1];
        self.events.push(TableEvent::HoleRevealed(hole));

        loop {
            self.clock.sleep(DEALER_DRAW_DELAY).await;
            let round = self.round.as_mut().ok_or(RoundError::OutOfTurn)?;
            match round.dealer_step(&mut self.shoe)? {
                DealerStep::Drew(card) => self.events.push(TableEvent::DealerCard(card)),
                DealerStep::Done(outcome) => {
                    self.settle(outcome).await;
                    return Ok(());
                }
            }
        }
    }

    /// Clear the table for the next round. Rejected while a round is
    /// still live. Rebuilds the shoe once it runs below one deck.
    pub fn new_game(&mut self) -> Result<()> {
        if matches!(self.phase(), Some(Phase::PlayerTurn) | Some(Phase::DealerTurn)) {
            return Err(RoundError::OutOfTurn.into());
        }
        self.round = None;
        self.settled = false;
        self.stack.clear();
        if self.shoe.remaining() < 52 {
            self.shoe = Shoe::new(Shoe::STANDARD_DECKS, &mut self.rng);
        }
        Ok(())
    }

    /// Issue the round's single terminal mutation and emit the result.
    /// A settled round can never settle again.
    async fn settle(&mut self, outcome: Outcome) {
        if self.settled {
            return;
        }
        self.settled = true;

        let message = self.result_message(outcome);
        self.clock.sleep(RESULT_DELAY).await;
        self.events.push(TableEvent::Result { outcome, message });

        let bet = self.round.as_ref().map(Round::bet).unwrap_or(Amount::ZERO);
        match self.backend.update(bet, outcome.action()).await {
            Ok(balance) => {
                self.balance = balance;
                self.events.push(TableEvent::Balance(balance));
            }
            Err(err) => {
                tracing::warn!(%err, "settlement call failed");
                self.events.push(TableEvent::BackendError(err.to_string()));
            }
        }

        self.clock.sleep(CONTROLS_DELAY).await;
        self.events.push(TableEvent::ControlsUnlocked);
    }

    fn result_message(&self, outcome: Outcome) -> String {
        let round = match &self.round {
            Some(round) => round,
            None => return String::new(),
        };
        let bet = round.bet();
        match outcome {
            Outcome::Blackjack => {
                let payout = bet.blackjack_payout().unwrap_or(bet);
                format!("BlackJack! You Win ${payout}")
            }
            Outcome::Win => {
                let winnings = bet.checked_mul(2).unwrap_or(bet);
                if round.dealer().is_bust() {
                    format!("Dealer Busts! You Win ${winnings}!")
                } else {
                    format!("You Win ${winnings}!")
                }
            }
            Outcome::Lose => {
                if round.player().is_bust() {
                    format!("You Bust! ({})", round.player_total())
                } else if round.dealer().is_blackjack() {
                    "Dealer Blackjack!".to_string()
                } else {
                    "Dealer Wins!".to_string()
                }
            }
            Outcome::Push => format!("Push ({})", round.player_total()),
        }
    }
}
