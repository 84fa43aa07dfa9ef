//! Flowstate core library.
//!
//! Central state and event coordination for a developer-productivity tracker:
//! - one authoritative `AppState` with global and key-scoped change
//!   subscriptions
//! - an in-process typed event bus for derived domain events
//! - keyed debouncing, used to coalesce snapshot writes
//! - durable snapshots behind a pluggable settings store (SQLite by default)
//!
//! # Architecture
//!
//! - `state`: `StateManager`, `AppState`, derived events, snapshot codec
//! - `bus`: `EventBus` and the closed set of event payloads
//! - `debounce`: keyed trailing/leading debouncer with max-wait
//! - `db`: SQLite settings store and daily focus history
//! - `progress`: leveling curve and collaborator helpers over the public API
//! - `config`: environment configuration
//! - `core`: clock and panic isolation shared by the above

pub mod bus;
pub mod config;
pub mod core;
pub mod db;
pub mod debounce;
pub mod progress;
pub mod state;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use serde::Serialize;

use bus::get_event_bus;
use config::CoreConfig;
use db::Database;
use debounce::get_debouncer;
use state::{install_state_manager, LoadOutcome, StateManager};

// ---------------------------------------------------------------------------
// Shared error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Db(#[from] db::DbError),
    #[error("{0}")]
    Persist(#[from] state::PersistError),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("{0}")]
    Other(String),
}

impl Serialize for AppError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

pub const LOG_ENV_VAR: &str = "FLOWSTATE_LOG";

/// Install the global `tracing` subscriber. Filter comes from `FLOWSTATE_LOG`,
/// then `RUST_LOG`, then `flowstate=debug,info`. Later calls are no-ops.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| "flowstate=debug,info".parse().expect("valid env filter"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

// ---------------------------------------------------------------------------
// Activation
// ---------------------------------------------------------------------------

/// A running core: the installed manager and the database behind it.
pub struct Core {
    pub config: CoreConfig,
    pub db: Arc<Database>,
    pub manager: Arc<StateManager>,
    pub load_outcome: LoadOutcome,
}

/// Open the database under `config.data_dir`, restore the persisted
/// snapshot, and install the manager as the process-wide instance.
pub async fn activate(config: CoreConfig) -> Result<Core, AppError> {
    std::fs::create_dir_all(&config.data_dir).map_err(|e| {
        AppError::Other(format!(
            "failed to create data directory {}: {e}",
            config.data_dir.display()
        ))
    })?;

    let db = Arc::new(Database::open(config.db_path())?);
    let manager = StateManager::new(
        get_event_bus(),
        get_debouncer(),
        db.clone(),
        config.store_config(),
    );
    let load_outcome = manager.load().await;

    if let Some(previous) = install_state_manager(manager.clone()) {
        previous.cancel_pending_write();
    }
    tracing::info!(
        data_dir = %config.data_dir.display(),
        ?load_outcome,
        "flowstate activated"
    );

    Ok(Core {
        config,
        db,
        manager,
        load_outcome,
    })
}

/// Flush any pending write and stop scheduling new ones.
pub async fn deactivate(core: &Core) {
    core.manager.deactivate().await;
}
