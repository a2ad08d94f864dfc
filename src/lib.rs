//! rAttendance library root.
//! Exposes CLI parser, high-level run() function, and internal modules.

pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod models;
pub mod sync;
pub mod ui;
pub mod utils;

use crate::core::controller::AttendanceController;
use crate::core::location::{AnyResolver, BoundedResolver, Disabled};
use crate::db::store::LocalStore;
use crate::sync::engine::{RetryPolicy, SyncEngine};
use crate::sync::transport::{AttendanceApi, HttpApi};
use clap::Parser;
use cli::parser::{Cli, Commands};
use config::Config;
use errors::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt};

pub type Engine = SyncEngine<HttpApi>;
pub type Controller = AttendanceController<HttpApi, AnyResolver>;

pub fn retry_policy(cfg: &Config) -> RetryPolicy {
    RetryPolicy {
        max_attempts: cfg.retry_attempts.max(1),
        base_delay: Duration::from_millis(cfg.retry_delay_ms),
        schedule_retry: Duration::from_secs(cfg.schedule_retry_secs),
    }
}

pub fn open_store(cfg: &Config) -> AppResult<LocalStore> {
    LocalStore::open(&cfg.database)
}

/// Build the sync engine, seeding connectivity from one health probe.
pub async fn connect(cfg: &Config, store: LocalStore) -> Arc<Engine> {
    let api = HttpApi::new(&cfg.api_endpoint, cfg.request_timeout());

    let online = match api.health().await {
        Ok(ok) => ok,
        Err(e) => {
            tracing::debug!(error = %e, endpoint = %cfg.api_endpoint, "server unreachable");
            false
        }
    };

    Arc::new(SyncEngine::new(store, api, retry_policy(cfg), online))
}

/// Engine that starts offline without probing, for commands that only read
/// the local store.
pub fn local_engine(cfg: &Config, store: LocalStore) -> Arc<Engine> {
    let api = HttpApi::new(&cfg.api_endpoint, cfg.request_timeout());
    Arc::new(SyncEngine::new(store, api, retry_policy(cfg), false))
}

pub fn controller(cfg: &Config, engine: Arc<Engine>) -> AppResult<Controller> {
    let resolver = match AnyResolver::from_config(&cfg.location) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, "location disabled");
            AnyResolver::Disabled(Disabled)
        }
    };

    AttendanceController::new(
        engine,
        BoundedResolver::new(resolver, cfg.location_timeout()),
    )
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rattendance={level},warn")));

    // a subscriber may already be installed
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

/// Central command dispatcher
pub async fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    use crate::cli::commands;

    match &cli.command {
        Commands::Init => commands::init::handle(cli),
        Commands::Config { .. } => commands::config::handle(&cli.command, cfg),
        Commands::Log { .. } => commands::log::handle(&cli.command, cfg),
        Commands::In => commands::attendance::check_in(cfg).await,
        Commands::Out => commands::attendance::check_out(cfg).await,
        Commands::Status { .. } => commands::status::handle(&cli.command, cfg).await,
        Commands::List { .. } => commands::list::handle(&cli.command, cfg),
        Commands::Stats => commands::stats::handle(cfg),
        Commands::Sync { .. } => commands::sync::handle(&cli.command, cfg).await,
        Commands::Queue => commands::queue::handle(cfg),
        Commands::Health => commands::health::handle(cfg).await,
        Commands::Daemon { .. } => commands::daemon::handle(&cli.command, cfg).await,
        Commands::Del { .. } => commands::del::handle(&cli.command, cfg),
        Commands::Reset { .. } => commands::reset::handle(&cli.command, cfg),
    }
}

/// Entry point used by main.rs
pub fn run() -> AppResult<()> {
    let cli = Cli::parse();

    let mut cfg = Config::load()?;
    if let Some(custom_db) = &cli.db {
        cfg.database = Config::resolve_db_path(custom_db)
            .to_string_lossy()
            .to_string();
    }
    if let Some(endpoint) = &cli.endpoint {
        cfg.api_endpoint = endpoint.clone();
    }

    init_tracing(&cfg.log_level);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::Other(format!("cannot start async runtime: {}", e)))?;

    runtime.block_on(dispatch(&cli, &cfg))
}
