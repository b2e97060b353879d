//! Client-side parlor: the HTTP API client, the blackjack round
//! orchestrator, chip-stack bookkeeping, and the money-clicker spawn
//! scheduler.
//!
//! All game flow lives here; the server only validates sessions and
//! applies balance deltas. Everything that talks to the server goes
//! through [`BalanceBackend`] so game logic can be driven against an
//! in-memory fake.

pub mod api;
pub mod chips;
pub mod orchestrator;
pub mod spawner;

pub use api::ApiClient;
pub use chips::ChipStack;
pub use orchestrator::{Orchestrator, TableEvent};
pub use spawner::SpawnScheduler;

use parlor_engine::RoundError;
use parlor_types::api::ClickResponse;
use parlor_types::{Amount, BalanceAction, api::ClickedItem};
use thiserror::Error;

/// Error type for client operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("failed: {status}: {message}")]
    Failed {
        status: reqwest::StatusCode,
        message: String,
    },
    #[error("no session token")]
    NotAuthenticated,
    #[error(transparent)]
    Round(#[from] RoundError),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The server seam: every balance read and mutation the client issues.
///
/// Implemented by [`ApiClient`] over HTTP; tests drive the orchestrator
/// and spawner against an in-memory fake.
#[allow(async_fn_in_trait)]
pub trait BalanceBackend {
    /// Current committed balance.
    async fn balance(&self) -> Result<Amount>;

    /// Apply one table-game action; returns the new balance.
    async fn update(&self, wager: Amount, action: BalanceAction) -> Result<Amount>;

    /// Credit one money-clicker click.
    async fn click(&self, item: &ClickedItem) -> Result<ClickResponse>;
}
