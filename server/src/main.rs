use anyhow::{Context, Result};
use clap::Parser;
use parlor_server::{api, ledger::Ledger, App, ServerConfig};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "parlor-server", about = "Balance ledger and HTTP API for parlor")]
struct Args {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to serve on.
    #[arg(long, default_value_t = 3001)]
    port: u16,

    /// Path to the sqlite ledger database.
    #[arg(long, default_value = "parlor.db")]
    db: PathBuf,

    /// Comma-separated allowed CORS origins; `*` allows any.
    #[arg(long, default_value = "*")]
    allowed_origins: String,

    /// Per-IP request rate limit (requests per second).
    #[arg(long)]
    rate_limit_per_second: Option<u64>,

    /// Burst size for the rate limit.
    #[arg(long)]
    rate_limit_burst: Option<u32>,

    /// Maximum request body size in bytes.
    #[arg(long, default_value_t = 64 * 1024)]
    body_limit_bytes: usize,

    /// Enable `POST /api/session` dev login. Never enable in production.
    #[arg(long)]
    dev_login: bool,

    /// Override the balance granted to new users, in dollars.
    #[arg(long)]
    starting_balance: Option<i64>,
}

fn build_config(args: &Args) -> ServerConfig {
    ServerConfig {
        port: args.port,
        db_path: args.db.clone(),
        allowed_origins: args
            .allowed_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect(),
        rate_limit_per_second: args.rate_limit_per_second,
        rate_limit_burst: args.rate_limit_burst,
        body_limit_bytes: Some(args.body_limit_bytes),
        dev_login: args.dev_login,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let config = build_config(&args);
    if config.dev_login {
        tracing::warn!("dev login is enabled; sessions can be created by anyone");
    }

    let mut ledger = Ledger::open(&config.db_path)
        .with_context(|| format!("open ledger at {}", config.db_path.display()))?;
    if let Some(dollars) = args.starting_balance {
        ledger = ledger.with_starting_balance(parlor_types::Amount::from_dollars(dollars));
    }
    let app = Arc::new(App::new(config, ledger));

    let addr = SocketAddr::new(args.host, args.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!(%addr, "parlor server listening");

    axum::serve(listener, api::router(app))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(?err, "failed to install ctrl-c handler");
        return;
    }
    info!("shutting down");
}
