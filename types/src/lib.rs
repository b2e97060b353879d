//! Shared types for parlor.
//!
//! Everything that crosses a crate boundary lives here: monetary amounts,
//! the balance-mutation action enum, playing cards, the spawnable-item
//! table, and the HTTP request/response shapes.

mod action;
mod amount;
pub mod api;
mod cards;
pub mod items;

pub use action::{BalanceAction, ParseActionError};
pub use amount::Amount;
pub use cards::{Card, Rank, Suit};

/// Balance granted to a freshly created user.
pub const STARTING_BALANCE: Amount = Amount::from_cents(100_000);

/// Credit for the base money-clicker click.
pub const DOLLAR_BILL_VALUE: Amount = Amount::from_cents(100);

/// Display name the server reports for the base click.
pub const DOLLAR_BILL_NAME: &str = "Dollar bill";

/// Kind id the client sends for the base click.
pub const DOLLAR_BILL_KIND: &str = "dollar_bill";
