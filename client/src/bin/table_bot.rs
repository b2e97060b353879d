//! Demo bot: logs in through the dev session endpoint and plays
//! blackjack rounds with a fixed-chip bet and a hit-below-17 strategy.

use anyhow::{Context, Result};
use clap::Parser;
use parlor_client::orchestrator::TokioClock;
use parlor_client::{ApiClient, Orchestrator, TableEvent};
use parlor_engine::Phase;
use rand::{rngs::StdRng, SeedableRng};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "table-bot", about = "Plays blackjack against a parlor server")]
struct Args {
    /// Base URL of the server.
    #[arg(long, default_value = "http://127.0.0.1:3001")]
    url: String,

    /// Username for the dev session.
    #[arg(long, default_value = "bot")]
    username: String,

    /// Rounds to play.
    #[arg(long, default_value_t = 10)]
    rounds: u32,

    /// Chip denomination placed each round, in dollars.
    #[arg(long, default_value_t = 10)]
    chip: i64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();
    let args = Args::parse();

    let mut api = ApiClient::new(&args.url)?;
    let balance = api
        .login(&args.username)
        .await
        .context("dev login (is the server running with --dev-login?)")?;
    info!(%balance, username = %args.username, "logged in");

    let mut table = Orchestrator::connect(api, TokioClock, StdRng::from_entropy())
        .await
        .context("connect")?;

    for round in 1..=args.rounds {
        table
            .add_chip(args.chip)
            .with_context(|| format!("placing a ${} chip", args.chip))?;
        table.play().await.context("play")?;

        while table.phase() == Some(Phase::PlayerTurn) {
            let total = table
                .round()
                .map(|round| round.player_total())
                .unwrap_or(21);
            if total < 17 {
                table.hit().await.context("hit")?;
            } else {
                table.stand().await.context("stand")?;
            }
        }

        for event in table.drain_events() {
            match event {
                TableEvent::Result { message, .. } => info!(round, "{message}"),
                TableEvent::Balance(balance) => info!(round, %balance, "balance"),
                TableEvent::Warning { message, .. } => info!(round, "{message}"),
                _ => {}
            }
        }
        table.new_game().context("new game")?;
    }

    info!(balance = %table.balance(), "done");
    Ok(())
}
