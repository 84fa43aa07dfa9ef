//! Shared setup for the SQLite-backed integration tests.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use flowstate::bus::EventBus;
use flowstate::db::Database;
use flowstate::debounce::Debouncer;
use flowstate::state::{StateManager, StoreConfig};

pub const PERSIST_DELAY: Duration = Duration::from_millis(200);

pub struct Stack {
    pub db: Arc<Database>,
    pub bus: Arc<EventBus>,
    pub manager: Arc<StateManager>,
}

/// A manager over a database file in `dir`, on its own bus and debouncer.
pub fn open_stack(dir: &Path) -> Stack {
    let db = Arc::new(Database::open(dir.join("flowstate.db")).expect("open database"));
    let bus = Arc::new(EventBus::new());
    let manager = StateManager::new(
        bus.clone(),
        Arc::new(Debouncer::new()),
        db.clone(),
        StoreConfig {
            persist_delay: PERSIST_DELAY,
            persist_max_wait: Some(PERSIST_DELAY * 4),
            ..StoreConfig::default()
        },
    );
    Stack { db, bus, manager }
}
