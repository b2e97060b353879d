//! Blackjack round logic.
//!
//! This crate is deterministic given the shoe contents: no I/O, no clock,
//! no randomness beyond the shuffle the caller seeds. The orchestrator in
//! `parlor-client` owns pacing and balance mutations; the engine only
//! decides what the cards say.

mod hand;
mod round;
mod shoe;

pub use hand::Hand;
pub use round::{DealerStep, Outcome, Phase, Round, RoundError};
pub use shoe::Shoe;
