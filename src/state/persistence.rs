//! Persistence adapter boundary.
//!
//! The state store reads its snapshot once at startup and writes it back
//! through the debouncer. Anything that can store a string under a key can
//! back it.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::error::PersistError;

/// Settings key the snapshot is stored under unless configured otherwise.
pub const DEFAULT_SETTINGS_KEY: &str = "app_state";

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<String>, PersistError>;

    async fn write(&self, key: &str, value: &str) -> Result<(), PersistError>;
}

/// In-process settings map. Default backing store for the lazily-built
/// singleton and for tests.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current raw value for `key`, bypassing the async interface.
    pub fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .expect("memory settings mutex poisoned")
            .get(key)
            .cloned()
    }

    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values
            .lock()
            .expect("memory settings mutex poisoned")
            .insert(key.into(), value.into());
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn read(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.get(key))
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), PersistError> {
        self.insert(key, value);
        Ok(())
    }
}
