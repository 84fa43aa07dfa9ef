//! Keyed delay/coalesce scheduler.
//!
//! A burst of [`Trigger::call`]s under one key collapses into a single
//! execution of the latest action, `delay` after the last call. With
//! `max_wait`, a second timer armed at the start of the burst forces one
//! execution even if calls never stop arriving.
//!
//! Timers are tokio tasks. Each armed timer carries a ticket; a timer only
//! fires if its ticket is still the one recorded for its key, so an aborted
//! or superseded timer that already woke up cannot run a stale action.
//!
//! Calls from threads outside the runtime arm their timers on the last
//! runtime the debouncer saw. Only a debouncer that never saw one runs
//! actions inline.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dashmap::DashMap;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::core::run_isolated;

type Job = Box<dyn FnOnce() + Send + Sync>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebounceOptions {
    /// Run the first call of a burst synchronously, in addition to the
    /// trailing execution.
    pub immediate: bool,
    /// Upper bound on how long a burst may defer execution.
    pub max_wait: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    Debounce,
    MaxWait,
}

struct Timer {
    ticket: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Slot {
    debounce: Option<Timer>,
    max_wait: Option<Timer>,
    job: Option<Job>,
}

impl Slot {
    fn is_armed(&self) -> bool {
        self.debounce.is_some() || self.max_wait.is_some()
    }

    fn timer(&self, kind: TimerKind) -> Option<&Timer> {
        match kind {
            TimerKind::Debounce => self.debounce.as_ref(),
            TimerKind::MaxWait => self.max_wait.as_ref(),
        }
    }

    /// Disarm both timers and hand back the pending job.
    fn disarm(&mut self, except: Option<TimerKind>) -> Option<Job> {
        for (kind, timer) in [
            (TimerKind::Debounce, self.debounce.take()),
            (TimerKind::MaxWait, self.max_wait.take()),
        ] {
            if let Some(timer) = timer {
                // A firing timer drops its own handle instead of aborting itself.
                if except != Some(kind) {
                    timer.handle.abort();
                }
            }
        }
        self.job.take()
    }
}

struct Shared {
    slots: DashMap<String, Slot>,
    tickets: AtomicU64,
    runtime: Mutex<Option<Handle>>,
}

impl Shared {
    fn next_ticket(&self) -> u64 {
        self.tickets.fetch_add(1, Ordering::Relaxed)
    }

    /// The caller's runtime if it has one, else the last one seen.
    fn runtime(&self) -> Option<Handle> {
        let mut remembered = self.runtime.lock().expect("debouncer runtime mutex poisoned");
        match Handle::try_current() {
            Ok(current) => {
                *remembered = Some(current.clone());
                Some(current)
            }
            Err(_) => remembered.clone(),
        }
    }

    fn fire(&self, key: &str, kind: TimerKind, ticket: u64) {
        let job = {
            let Some(mut slot) = self.slots.get_mut(key) else {
                return;
            };
            if slot.timer(kind).map(|t| t.ticket) != Some(ticket) {
                return;
            }
            slot.disarm(Some(kind))
        };
        self.slots.remove_if(key, |_, slot| !slot.is_armed());

        if let Some(job) = job {
            tracing::debug!(key, ?kind, "debounced action firing");
            run_isolated(&format!("debounced action `{key}`"), job);
        }
    }
}

/// Process-wide keyed scheduler. Cheap to share behind an `Arc`.
pub struct Debouncer {
    shared: Arc<Shared>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                slots: DashMap::new(),
                tickets: AtomicU64::new(1),
                runtime: Mutex::new(Handle::try_current().ok()),
            }),
        }
    }

    /// Build a trigger that schedules `action` under `key`.
    pub fn debounce<A, F>(
        &self,
        key: impl Into<String>,
        action: F,
        delay: Duration,
        options: DebounceOptions,
    ) -> Trigger<A>
    where
        A: Clone + Send + Sync + 'static,
        F: Fn(A) + Send + Sync + 'static,
    {
        Trigger {
            inner: Arc::new(TriggerInner {
                key: key.into(),
                action: Box::new(action),
                delay,
                options,
                shared: self.shared.clone(),
            }),
        }
    }

    /// Drop any pending execution for `key` without running it.
    pub fn cancel(&self, key: &str) {
        if let Some((_, mut slot)) = self.shared.slots.remove(key) {
            slot.disarm(None);
            tracing::debug!(key, "debounce cancelled");
        }
    }

    /// Cancel pending timers for `key` and run `action(args)` right now.
    pub fn flush<A, F>(&self, key: &str, action: F, args: A)
    where
        F: FnOnce(A),
    {
        self.cancel(key);
        run_isolated(&format!("debounced action `{key}`"), || action(args));
    }

    /// True if a debounce or max-wait timer is outstanding for `key`.
    pub fn pending(&self, key: &str) -> bool {
        self.shared
            .slots
            .get(key)
            .map_or(false, |slot| slot.is_armed())
    }

    /// Cancel every key. Used on teardown.
    pub fn cancel_all(&self) {
        let keys: Vec<String> = self.shared.slots.iter().map(|e| e.key().clone()).collect();
        for key in keys {
            self.cancel(&key);
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new()
    }
}

struct TriggerInner<A> {
    key: String,
    action: Box<dyn Fn(A) + Send + Sync>,
    delay: Duration,
    options: DebounceOptions,
    shared: Arc<Shared>,
}

/// Handle returned by [`Debouncer::debounce`].
pub struct Trigger<A> {
    inner: Arc<TriggerInner<A>>,
}

impl<A> Clone for Trigger<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A: Clone + Send + Sync + 'static> Trigger<A> {
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Schedule the action with `args`, replacing whatever was pending.
    pub fn call(&self, args: A) {
        let inner = &self.inner;
        let Some(runtime) = inner.shared.runtime() else {
            tracing::warn!(key = %inner.key, "no async runtime; running debounced action inline");
            run_isolated(&format!("debounced action `{}`", inner.key), || {
                (inner.action)(args)
            });
            return;
        };

        let burst_start = {
            let shared = &inner.shared;
            let mut slot = shared.slots.entry(inner.key.clone()).or_default();
            let burst_start = !slot.is_armed();

            let job_inner = inner.clone();
            let job_args = args.clone();
            slot.job = Some(Box::new(move || (job_inner.action)(job_args)));

            if let Some(previous) = slot.debounce.take() {
                previous.handle.abort();
            }
            slot.debounce = Some(self.arm(&runtime, TimerKind::Debounce, inner.delay));

            if burst_start {
                if let Some(max_wait) = inner.options.max_wait {
                    slot.max_wait = Some(self.arm(&runtime, TimerKind::MaxWait, max_wait));
                }
            }
            burst_start
        };

        if burst_start && inner.options.immediate {
            run_isolated(&format!("debounced action `{}`", inner.key), || {
                (inner.action)(args)
            });
        }
    }

    /// Drop the pending execution for this trigger's key.
    pub fn cancel(&self) {
        if let Some((_, mut slot)) = self.inner.shared.slots.remove(&self.inner.key) {
            slot.disarm(None);
        }
    }

    /// Run the pending execution now, if there is one.
    pub fn flush(&self) -> bool {
        let job = self
            .inner
            .shared
            .slots
            .remove(&self.inner.key)
            .and_then(|(_, mut slot)| slot.disarm(None));
        match job {
            Some(job) => {
                run_isolated(&format!("debounced action `{}`", self.inner.key), job);
                true
            }
            None => false,
        }
    }

    pub fn pending(&self) -> bool {
        self.inner
            .shared
            .slots
            .get(&self.inner.key)
            .map_or(false, |slot| slot.is_armed())
    }

    fn arm(&self, runtime: &Handle, kind: TimerKind, after: Duration) -> Timer {
        let shared = self.inner.shared.clone();
        let key = self.inner.key.clone();
        let ticket = shared.next_ticket();
        let handle = runtime.spawn(async move {
            tokio::time::sleep(after).await;
            shared.fire(&key, kind, ticket);
        });
        Timer { ticket, handle }
    }
}

// ---------------------------------------------------------------------------
// Process-wide instance
// ---------------------------------------------------------------------------

static GLOBAL_DEBOUNCER: Mutex<Option<Arc<Debouncer>>> = Mutex::new(None);

pub fn get_debouncer() -> Arc<Debouncer> {
    let mut slot = GLOBAL_DEBOUNCER
        .lock()
        .expect("global debouncer mutex poisoned");
    slot.get_or_insert_with(|| Arc::new(Debouncer::new())).clone()
}

/// Cancel everything pending on the shared debouncer and drop it.
pub fn reset_debouncer() {
    let previous = GLOBAL_DEBOUNCER
        .lock()
        .expect("global debouncer mutex poisoned")
        .take();
    if let Some(debouncer) = previous {
        debouncer.cancel_all();
    }
}
