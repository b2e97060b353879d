//! Chip-stack bookkeeping for the bet display.
//!
//! The stack tracks which chip images sit on the table; combining
//! collapses runs of chips into higher denominations, never changing the
//! wagered total. Settlement only ever reads [`ChipStack::total`].

use parlor_types::Amount;
use thiserror::Error;

/// Chip denominations, in dollars.
pub const DENOMINATIONS: [i64; 9] = [1, 5, 10, 25, 50, 100, 1_000, 5_000, 10_000];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChipError {
    #[error("unknown chip denomination: ${0}")]
    UnknownDenomination(i64),
    #[error("bet would exceed the available balance")]
    ExceedsBalance,
    #[error("betting is closed while a round is live")]
    BettingClosed,
}

/// The chips currently placed as the bet.
///
/// An all-in wipes the stack and replaces it with a single pseudo-chip
/// worth the whole balance; placing a regular chip on top is impossible
/// because the available balance is already zero.
#[derive(Clone, Debug, Default)]
pub struct ChipStack {
    /// Placed chips in display order, dollar denominations.
    chips: Vec<i64>,
    all_in: Option<Amount>,
}

impl ChipStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total wagered so far.
    pub fn total(&self) -> Amount {
        match self.all_in {
            Some(amount) => amount,
            None => Amount::from_dollars(self.chips.iter().sum()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.all_in.is_none() && self.chips.is_empty()
    }

    /// The chips on display, in order.
    pub fn chips(&self) -> &[i64] {
        &self.chips
    }

    pub fn is_all_in(&self) -> bool {
        self.all_in.is_some()
    }

    /// Place one chip. Rejected when the denomination is unknown or the
    /// new total would exceed `balance`.
    pub fn add(&mut self, denomination: i64, balance: Amount) -> Result<(), ChipError> {
        if !DENOMINATIONS.contains(&denomination) {
            return Err(ChipError::UnknownDenomination(denomination));
        }
        let next_total = self
            .total()
            .checked_add(Amount::from_dollars(denomination))
            .ok_or(ChipError::ExceedsBalance)?;
        if next_total > balance {
            return Err(ChipError::ExceedsBalance);
        }
        self.push_chip(denomination);
        Ok(())
    }

    /// Bet the whole balance as one pseudo-chip, replacing the stack.
    pub fn all_in(&mut self, balance: Amount) {
        if balance.is_positive() {
            self.chips.clear();
            self.all_in = Some(balance);
        }
    }

    /// Take back the chip at `index` (or the all-in pseudo-chip),
    /// returning the amount released to the balance display.
    pub fn remove(&mut self, index: usize) -> Option<Amount> {
        if let Some(amount) = self.all_in.take() {
            return Some(amount);
        }
        if index < self.chips.len() {
            Some(Amount::from_dollars(self.chips.remove(index)))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.chips.clear();
        self.all_in = None;
    }

    fn count(&self, denomination: i64) -> usize {
        self.chips.iter().filter(|c| **c == denomination).count()
    }

    fn take(&mut self, denomination: i64, n: usize) {
        for _ in 0..n {
            if let Some(pos) = self.chips.iter().position(|c| *c == denomination) {
                self.chips.remove(pos);
            }
        }
    }

    /// Push a chip and cascade the combining rules it triggers.
    fn push_chip(&mut self, value: i64) {
        self.chips.push(value);
        self.combine(value);
    }

    // The combining rules, checked in order after each placement:
    // five $1/$10/$1000 tier up; two $10 plus a $5 make a $25; pairs of
    // the in-between denominations double; ten of a kind jump a decade.
    fn combine(&mut self, value: i64) {
        if matches!(value, 1 | 10 | 1_000) && self.count(value) >= 5 {
            self.take(value, 5);
            self.push_chip(value * 5);
        } else if self.count(5) >= 1 && self.count(10) >= 2 {
            self.take(10, 2);
            self.take(5, 1);
            self.push_chip(25);
        } else if self.count(value) >= 2 && !matches!(value, 1 | 10 | 100 | 1_000 | 10_000) {
            self.take(value, 2);
            self.push_chip(value * 2);
        } else if self.count(value) >= 10 && !matches!(value, 25 | 50 | 5_000) {
            self.take(value, 10);
            self.push_chip(value * 10);
        }
    }
}
