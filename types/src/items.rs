//! Spawnable money-clicker items.
//!
//! One data-driven table instead of a type per item: a kind is entirely
//! described by its configuration row, and nothing downstream branches on
//! which kind it is.

use crate::Amount;
use std::time::Duration;

/// Configuration for one spawnable item kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemKind {
    /// Stable identifier used on the wire and in spawn caps.
    pub id: &'static str,
    /// Display name reported back by the click endpoint.
    pub name: &'static str,
    /// Spawn weight out of a nominal 100. Weights need not sum to 100;
    /// the leftover mass is the no-spawn outcome.
    pub weight: u32,
    /// Balance credit when clicked.
    pub value: Amount,
    /// Rendered width, for the embedding UI.
    pub size_px: u16,
    /// How long a spawned instance stays up before self-expiring.
    pub lifetime: Duration,
    /// Maximum concurrently visible instances of this kind.
    pub spawn_limit: usize,
    /// Feedback cue id played on click.
    pub sound: &'static str,
    /// Asset path for the embedding UI.
    pub image: &'static str,
}

pub const GOLD_COIN: ItemKind = ItemKind {
    id: "gold_coin",
    name: "Gold Coin",
    weight: 50,
    value: Amount::from_cents(2_500),
    size_px: 70,
    lifetime: Duration::from_secs(6),
    spawn_limit: 3,
    sound: "gold_coin",
    image: "/pictures/gold_coin.png",
};

pub const RUBY: ItemKind = ItemKind {
    id: "ruby",
    name: "Ruby",
    weight: 10,
    value: Amount::from_cents(10_000),
    size_px: 30,
    lifetime: Duration::from_secs(6),
    spawn_limit: 2,
    sound: "ruby",
    image: "/pictures/ruby.png",
};

pub const DIAMOND: ItemKind = ItemKind {
    id: "diamond",
    name: "Diamond",
    weight: 2,
    value: Amount::from_cents(50_000),
    size_px: 50,
    lifetime: Duration::from_secs(6),
    spawn_limit: 1,
    sound: "diamond",
    image: "/pictures/diamond.png",
};

/// All spawnable kinds, in cumulative-weight order for selection.
pub const ITEM_KINDS: [ItemKind; 3] = [GOLD_COIN, RUBY, DIAMOND];

/// Look up a kind by id.
pub fn item_kind(id: &str) -> Option<&'static ItemKind> {
    ITEM_KINDS.iter().find(|kind| kind.id == id)
}
