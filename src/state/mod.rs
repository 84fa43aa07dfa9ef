//! Central state and event coordination.
//!
//! One [`AppState`] per process, owned by a [`StateManager`]. Collaborators
//! write through [`StateManager::set_state`] with a [`StatePatch`] and observe
//! through subscriptions or the event bus; nobody holds a mutable reference
//! into the live state.
//!
//! # Persistence
//!
//! The whole state is written as one JSON snapshot under a single settings key
//! (see [`snapshot`]), debounced so a burst of writes costs one store call.
//! Durability is best effort: a crash between debounce windows loses the
//! latest changes.

pub mod derive;
mod error;
pub mod model;
mod persistence;
pub mod snapshot;
mod store;

pub use derive::{derive_events, DerivedEvent};
pub use error::PersistError;
pub use model::*;
pub use persistence::{MemorySettings, SettingsStore, DEFAULT_SETTINGS_KEY};
pub use store::{
    get_state_manager, install_state_manager, reset_state_manager, LoadOutcome, StateManager,
    StateSubscription, StoreConfig, DEFAULT_PERSIST_DELAY, DEFAULT_PERSIST_MAX_WAIT,
};

#[cfg(test)]
mod tests;
