use crate::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The fixed set of named balance deltas the mutation service accepts.
///
/// `Bet` is the only deduction; `Lose` exists so a resolved round still
/// reports its terminal action even though the bet was already taken.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceAction {
    Bet,
    Win,
    Blackjack,
    Lose,
    Push,
}

#[derive(Debug, Error)]
#[error("invalid action: {0}")]
pub struct ParseActionError(pub String);

impl BalanceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BalanceAction::Bet => "bet",
            BalanceAction::Win => "win",
            BalanceAction::Blackjack => "blackjack",
            BalanceAction::Lose => "lose",
            BalanceAction::Push => "push",
        }
    }

    /// Apply this action's delta to a committed balance. `wager` is the
    /// amount staked when the round began. Returns `None` on arithmetic
    /// overflow; the caller aborts the enclosing transaction.
    pub fn apply_to(self, balance: Amount, wager: Amount) -> Option<Amount> {
        match self {
            BalanceAction::Bet => balance.checked_sub(wager),
            BalanceAction::Win => balance.checked_add(wager.checked_mul(2)?),
            BalanceAction::Blackjack => balance.checked_add(wager.blackjack_payout()?),
            BalanceAction::Lose => Some(balance),
            BalanceAction::Push => balance.checked_add(wager),
        }
    }
}

impl fmt::Display for BalanceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BalanceAction {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bet" => Ok(BalanceAction::Bet),
            "win" => Ok(BalanceAction::Win),
            "blackjack" => Ok(BalanceAction::Blackjack),
            "lose" => Ok(BalanceAction::Lose),
            "push" => Ok(BalanceAction::Push),
            other => Err(ParseActionError(other.to_string())),
        }
    }
}
