//! The parlor backend: a ledger of per-user balances behind a small
//! authenticated HTTP API. Game logic lives client-side; the server's
//! job is to make every balance mutation atomic, serialized per user,
//! and durable.

pub mod api;
pub mod ledger;
pub mod metrics;
pub mod service;
pub mod session;

use ledger::Ledger;
use metrics::Metrics;
use service::BalanceService;
use session::SessionStore;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub db_path: PathBuf,
    /// Allowed CORS origins; `*` allows any origin.
    pub allowed_origins: Vec<String>,
    pub rate_limit_per_second: Option<u64>,
    pub rate_limit_burst: Option<u32>,
    pub body_limit_bytes: Option<usize>,
    /// Enables `POST /api/session` (dev mode only). Production plugs the
    /// real session issuer into [`SessionStore`] instead.
    pub dev_login: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            db_path: PathBuf::from("parlor.db"),
            allowed_origins: vec!["*".to_string()],
            rate_limit_per_second: None,
            rate_limit_burst: None,
            body_limit_bytes: Some(64 * 1024),
            dev_login: false,
        }
    }
}

/// Shared state behind every handler.
pub struct App {
    pub config: ServerConfig,
    pub ledger: Arc<Ledger>,
    pub sessions: SessionStore,
    pub service: BalanceService,
    pub metrics: Arc<Metrics>,
}

impl App {
    pub fn new(config: ServerConfig, ledger: Ledger) -> Self {
        let ledger = Arc::new(ledger);
        let metrics = Arc::new(Metrics::default());
        let service = BalanceService::new(Arc::clone(&ledger), Arc::clone(&metrics));
        Self {
            config,
            ledger,
            sessions: SessionStore::default(),
            service,
            metrics,
        }
    }
}
