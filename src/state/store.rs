use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::runtime::Handle;

use crate::bus::{get_event_bus, DataLoaded, DataReset, DataSaved, EventBus};
use crate::core::{now_ms, run_isolated};
use crate::debounce::{get_debouncer, DebounceOptions, Debouncer, Trigger};

use super::derive::derive_events;
use super::error::PersistError;
use super::model::{AppState, StateKey, StatePatch, StateSlice};
use super::persistence::{MemorySettings, SettingsStore, DEFAULT_SETTINGS_KEY};
use super::snapshot;

pub const DEFAULT_PERSIST_DELAY: Duration = Duration::from_millis(1_000);
pub const DEFAULT_PERSIST_MAX_WAIT: Duration = Duration::from_millis(5_000);

type GlobalHandler = Arc<dyn Fn(&AppState, Option<&AppState>) + Send + Sync>;
type KeyHandler = Arc<dyn Fn(&AppState, &AppState) + Send + Sync>;

/// Store-level settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub settings_key: String,
    pub persist_delay: Duration,
    pub persist_max_wait: Option<Duration>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            settings_key: DEFAULT_SETTINGS_KEY.to_string(),
            persist_delay: DEFAULT_PERSIST_DELAY,
            persist_max_wait: Some(DEFAULT_PERSIST_MAX_WAIT),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Scope {
    Global,
    Key(StateKey),
}

/// Token returned by the `subscribe*` methods; pass it to
/// [`StateManager::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[must_use = "dropping a StateSubscription leaves the subscriber registered with no way to remove it"]
pub struct StateSubscription {
    scope: Scope,
    id: u64,
}

impl StateSubscription {
    /// The key this subscription is scoped to, or `None` for a global one.
    pub fn key(&self) -> Option<StateKey> {
        match self.scope {
            Scope::Global => None,
            Scope::Key(key) => Some(key),
        }
    }
}

/// Which path [`StateManager::load`] took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A snapshot was found and replaced the in-memory state.
    Restored,
    /// Nothing was stored yet; current state kept.
    Defaults,
    /// The backend or the snapshot was unreadable; current state kept.
    Fallback,
}

/// Owner of the single `AppState`.
///
/// All mutation goes through [`set_state`](Self::set_state), which runs, in
/// order and before returning: global subscribers, key-scoped subscribers for
/// every key in the patch, derived-event emission. It then schedules a
/// debounced write of the whole snapshot.
///
/// No lock is held while subscribers or bus handlers run, so they may read
/// state, subscribe, or write again.
pub struct StateManager {
    state: Mutex<Arc<AppState>>,
    global: Mutex<Vec<(u64, GlobalHandler)>>,
    keyed: Mutex<HashMap<StateKey, Vec<(u64, KeyHandler)>>>,
    next_id: AtomicU64,
    bus: Arc<EventBus>,
    settings: Arc<dyn SettingsStore>,
    config: StoreConfig,
    persist_trigger: Trigger<()>,
    writes_enabled: AtomicBool,
}

impl StateManager {
    pub fn new(
        bus: Arc<EventBus>,
        debouncer: Arc<Debouncer>,
        settings: Arc<dyn SettingsStore>,
        config: StoreConfig,
    ) -> Arc<Self> {
        let runtime = Handle::try_current().ok();
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let weak = weak.clone();
            let persist_trigger = debouncer.debounce(
                format!("storage_write_{}", config.settings_key),
                move |()| {
                    let Some(manager) = weak.upgrade() else {
                        return;
                    };
                    match Handle::try_current().ok().or_else(|| runtime.clone()) {
                        Some(runtime) => {
                            runtime.spawn(async move { manager.persist().await });
                        }
                        None => tracing::warn!("no async runtime; scheduled state write skipped"),
                    }
                },
                config.persist_delay,
                DebounceOptions {
                    immediate: false,
                    max_wait: config.persist_max_wait,
                },
            );

            Self {
                state: Mutex::new(Arc::new(AppState::initial(now_ms()))),
                global: Mutex::new(Vec::new()),
                keyed: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                bus,
                settings,
                config,
                persist_trigger,
                writes_enabled: AtomicBool::new(true),
            }
        })
    }

    /// In-memory manager on the process-wide bus and debouncer.
    pub fn in_memory() -> Arc<Self> {
        Self::new(
            get_event_bus(),
            get_debouncer(),
            Arc::new(MemorySettings::new()),
            StoreConfig::default(),
        )
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Reads and writes
    // -----------------------------------------------------------------------

    /// Immutable snapshot of the current state. Later writes never change it.
    pub fn get_state(&self) -> Arc<AppState> {
        self.lock_state().clone()
    }

    /// Replace every sub-record present in `patch`.
    pub fn set_state(&self, patch: StatePatch) {
        let (next, previous) = {
            let mut current = self.lock_state();
            let previous = current.clone();
            let mut next = (*previous).clone();
            patch.apply_to(&mut next);
            let next = Arc::new(next);
            *current = next.clone();
            (next, previous)
        };

        let keys = patch.keys();
        tracing::debug!(?keys, "state updated");

        self.notify_global(&next, Some(&previous));
        for key in &keys {
            self.notify_key(*key, &next, &previous);
        }
        for event in derive_events(&patch, &previous, now_ms()) {
            event.publish(&self.bus);
        }

        if !keys.is_empty() {
            self.schedule_persist();
        }
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    /// Called with `(next, Some(previous))` on every write, and with
    /// `(next, None)` after `load` and `reset`.
    pub fn subscribe<F>(&self, handler: F) -> StateSubscription
    where
        F: Fn(&AppState, Option<&AppState>) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.global
            .lock()
            .expect("global subscriber mutex poisoned")
            .push((id, Arc::new(handler)));
        StateSubscription {
            scope: Scope::Global,
            id,
        }
    }

    /// Called with `(next, previous)` values of `S` whenever a patch carries
    /// `S`, even if the value did not change.
    pub fn subscribe_to_key<S, F>(&self, handler: F) -> StateSubscription
    where
        S: StateSlice,
        F: Fn(&S, &S) + Send + Sync + 'static,
    {
        self.on_key_change(S::KEY, move |next, previous| {
            handler(S::project(next), S::project(previous))
        })
    }

    /// Untyped form of [`subscribe_to_key`](Self::subscribe_to_key): the
    /// handler receives the whole next and previous states.
    pub fn on_key_change<F>(&self, key: StateKey, handler: F) -> StateSubscription
    where
        F: Fn(&AppState, &AppState) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.keyed
            .lock()
            .expect("key subscriber mutex poisoned")
            .entry(key)
            .or_default()
            .push((id, Arc::new(handler)));
        StateSubscription {
            scope: Scope::Key(key),
            id,
        }
    }

    /// Returns `false` if the subscription was already removed (including
    /// key-scoped subscriptions dropped by `reset`).
    pub fn unsubscribe(&self, subscription: StateSubscription) -> bool {
        match subscription.scope {
            Scope::Global => {
                let mut global = self.global.lock().expect("global subscriber mutex poisoned");
                let before = global.len();
                global.retain(|(id, _)| *id != subscription.id);
                global.len() != before
            }
            Scope::Key(key) => {
                let mut keyed = self.keyed.lock().expect("key subscriber mutex poisoned");
                let Some(list) = keyed.get_mut(&key) else {
                    return false;
                };
                let before = list.len();
                list.retain(|(id, _)| *id != subscription.id);
                let removed = list.len() != before;
                if list.is_empty() {
                    keyed.remove(&key);
                }
                removed
            }
        }
    }

    pub fn subscriber_count(&self, key: Option<StateKey>) -> usize {
        match key {
            None => self.global.lock().expect("global subscriber mutex poisoned").len(),
            Some(key) => self
                .keyed
                .lock()
                .expect("key subscriber mutex poisoned")
                .get(&key)
                .map_or(0, Vec::len),
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Back to factory defaults. Key-scoped subscribers are dropped; global
    /// subscribers see `(defaults, None)`.
    pub async fn reset(&self) {
        let fresh = Arc::new(AppState::initial(now_ms()));
        *self.lock_state() = fresh.clone();
        self.persist_trigger.cancel();

        self.notify_global(&fresh, None);
        self.keyed.lock().expect("key subscriber mutex poisoned").clear();

        self.persist().await;
        self.bus.emit(DataReset { timestamp: now_ms() });
        tracing::info!("state reset to defaults");
    }

    /// Write the current state now. Failures are logged; memory is untouched.
    pub async fn persist(&self) {
        if let Err(e) = self.try_persist().await {
            tracing::warn!("failed to persist state under `{}`: {e}", self.config.settings_key);
        }
    }

    /// [`persist`](Self::persist) with the error surfaced.
    pub async fn try_persist(&self) -> Result<(), PersistError> {
        let state = self.get_state();
        let encoded = snapshot::encode(&state)?;
        self.settings.write(&self.config.settings_key, &encoded).await?;

        tracing::debug!(bytes = encoded.len(), "state persisted");
        self.bus.emit(DataSaved { timestamp: now_ms() });
        Ok(())
    }

    /// Restore the persisted snapshot, if any, over the factory defaults.
    ///
    /// Expected to run once at startup before other writers are wired up.
    /// A concurrent `set_state` is simply overwritten.
    pub async fn load(&self) -> LoadOutcome {
        let raw = match self.settings.read(&self.config.settings_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::info!("no persisted state under `{}`; using defaults", self.config.settings_key);
                return LoadOutcome::Defaults;
            }
            Err(e) => {
                tracing::warn!("failed to read persisted state, falling back to defaults: {e}");
                return LoadOutcome::Fallback;
            }
        };

        let loaded = match snapshot::decode(&raw, &AppState::initial(now_ms())) {
            Ok(state) => Arc::new(state),
            Err(e) => {
                tracing::warn!("persisted state is unreadable, falling back to defaults: {e}");
                return LoadOutcome::Fallback;
            }
        };

        *self.lock_state() = loaded.clone();
        self.notify_global(&loaded, None);
        self.bus.emit(DataLoaded { timestamp: now_ms() });
        tracing::info!("restored persisted state");
        LoadOutcome::Restored
    }

    /// True while a debounced write is waiting to run.
    pub fn write_pending(&self) -> bool {
        self.persist_trigger.pending()
    }

    /// Drop the pending debounced write, if any.
    pub fn cancel_pending_write(&self) {
        self.persist_trigger.cancel();
    }

    /// Stop scheduling writes. A write that was pending runs once, now.
    pub async fn deactivate(&self) {
        self.writes_enabled.store(false, Ordering::SeqCst);
        if self.persist_trigger.pending() {
            self.persist_trigger.cancel();
            self.persist().await;
        }
        tracing::info!("state manager deactivated");
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn schedule_persist(&self) {
        if self.writes_enabled.load(Ordering::SeqCst) {
            self.persist_trigger.call(());
        }
    }

    fn notify_global(&self, next: &AppState, previous: Option<&AppState>) {
        let handlers: Vec<GlobalHandler> = self
            .global
            .lock()
            .expect("global subscriber mutex poisoned")
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();

        for handler in handlers {
            run_isolated("state subscriber", || handler(next, previous));
        }
    }

    fn notify_key(&self, key: StateKey, next: &AppState, previous: &AppState) {
        let handlers: Vec<KeyHandler> = match self
            .keyed
            .lock()
            .expect("key subscriber mutex poisoned")
            .get(&key)
        {
            Some(list) => list.iter().map(|(_, handler)| handler.clone()).collect(),
            None => return,
        };

        let context = format!("`{key}` subscriber");
        for handler in handlers {
            run_isolated(&context, || handler(next, previous));
        }
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn lock_state(&self) -> MutexGuard<'_, Arc<AppState>> {
        self.state.lock().expect("state mutex poisoned")
    }
}

// ---------------------------------------------------------------------------
// Process-wide instance
// ---------------------------------------------------------------------------

static GLOBAL_MANAGER: Mutex<Option<Arc<StateManager>>> = Mutex::new(None);

/// Shared manager. Built lazily over in-memory settings unless one was
/// installed with [`install_state_manager`].
pub fn get_state_manager() -> Arc<StateManager> {
    let mut slot = GLOBAL_MANAGER.lock().expect("global manager mutex poisoned");
    slot.get_or_insert_with(StateManager::in_memory).clone()
}

/// Make `manager` the shared instance, returning the one it replaces.
pub fn install_state_manager(manager: Arc<StateManager>) -> Option<Arc<StateManager>> {
    GLOBAL_MANAGER
        .lock()
        .expect("global manager mutex poisoned")
        .replace(manager)
}

/// Drop the shared manager and its pending write.
pub fn reset_state_manager() {
    let previous = GLOBAL_MANAGER
        .lock()
        .expect("global manager mutex poisoned")
        .take();
    if let Some(manager) = previous {
        manager.cancel_pending_write();
    }
}
