//! Test doubles and helpers shared by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::bus::EventBus;
use crate::debounce::Debouncer;
use crate::state::{MemorySettings, PersistError, SettingsStore, StateManager, StoreConfig};

/// Serializes tests that touch the process-wide bus, debouncer or manager.
static SINGLETON_TEST_MUTEX: Mutex<()> = Mutex::new(());

pub fn singleton_guard() -> MutexGuard<'static, ()> {
    SINGLETON_TEST_MUTEX
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub const TEST_PERSIST_DELAY: Duration = Duration::from_millis(100);

/// Settings store that counts reads and writes.
#[derive(Debug, Default)]
pub struct CountingSettings {
    pub inner: MemorySettings,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl CountingSettings {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SettingsStore for CountingSettings {
    async fn read(&self, key: &str) -> Result<Option<String>, PersistError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read(key).await
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), PersistError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.write(key, value).await
    }
}

/// Settings store whose every call fails.
#[derive(Debug, Default)]
pub struct FailingSettings;

#[async_trait]
impl SettingsStore for FailingSettings {
    async fn read(&self, _key: &str) -> Result<Option<String>, PersistError> {
        Err(PersistError::Backend("read refused".to_string()))
    }

    async fn write(&self, _key: &str, _value: &str) -> Result<(), PersistError> {
        Err(PersistError::Backend("write refused".to_string()))
    }
}

/// A privately-wired manager: its own bus and debouncer, short write delay.
pub struct Harness {
    pub manager: Arc<StateManager>,
    pub bus: Arc<EventBus>,
    pub debouncer: Arc<Debouncer>,
    pub settings: Arc<CountingSettings>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(Arc::new(CountingSettings::default()))
    }

    pub fn with_settings(settings: Arc<CountingSettings>) -> Self {
        let bus = Arc::new(EventBus::new());
        let debouncer = Arc::new(Debouncer::new());
        let manager = StateManager::new(
            bus.clone(),
            debouncer.clone(),
            settings.clone(),
            test_store_config(),
        );
        Self {
            manager,
            bus,
            debouncer,
            settings,
        }
    }
}

pub fn test_store_config() -> StoreConfig {
    StoreConfig {
        persist_delay: TEST_PERSIST_DELAY,
        persist_max_wait: Some(TEST_PERSIST_DELAY * 5),
        ..StoreConfig::default()
    }
}
