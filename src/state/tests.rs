//! StateManager unit tests

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use pretty_assertions::assert_eq;
    use tokio::time::sleep;

    use crate::bus::{
        DashboardClosed, DashboardOpened, DataLoaded, DataReset, DataSaved, DeepWorkStarted,
        EventBus, FileFocusChanged, PomodoroStarted,
    };
    use crate::debounce::Debouncer;
    use crate::state::{
        derive_events, get_state_manager, install_state_manager, reset_state_manager, snapshot,
        AppState, DeepWorkState, DerivedEvent, FocusState, LoadOutcome, MemorySettings,
        PomodoroState, SessionState, SettingsStore, StateKey, StateManager, StatePatch, UiState,
        XpState,
    };
    use crate::testing::{
        singleton_guard, test_store_config, CountingSettings, FailingSettings, Harness,
        TEST_PERSIST_DELAY,
    };

    fn count_events<E: crate::bus::Event>(bus: &EventBus) -> Arc<AtomicUsize> {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let _ = bus.on(move |_: &E| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        hits
    }

    fn focus_on(file: &str) -> FocusState {
        FocusState {
            current_file: Some(file.to_string()),
            ..FocusState::default()
        }
    }

    // ====================================================================================
    // WRITE PATH
    // ====================================================================================

    #[test]
    fn test_empty_patch_changes_nothing() {
        let h = Harness::new();
        let before = h.manager.get_state();

        let global_hits = Arc::new(AtomicUsize::new(0));
        let counter = global_hits.clone();
        let _ = h.manager.subscribe(move |_, previous| {
            assert!(previous.is_some());
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let key_hits = Arc::new(AtomicUsize::new(0));
        for key in StateKey::all() {
            let counter = key_hits.clone();
            let _ = h.manager.on_key_change(*key, move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        let focus_events = count_events::<FileFocusChanged>(&h.bus);

        h.manager.set_state(StatePatch::new());

        assert_eq!(*h.manager.get_state(), *before);
        assert_eq!(global_hits.load(Ordering::SeqCst), 1);
        assert_eq!(key_hits.load(Ordering::SeqCst), 0);
        assert_eq!(focus_events.load(Ordering::SeqCst), 0);
        assert!(!h.manager.write_pending());
    }

    #[test]
    fn test_only_subscribers_of_patched_key_fire() {
        let h = Harness::new();
        let fired = Arc::new(Mutex::new(Vec::new()));
        for key in StateKey::all() {
            let fired = fired.clone();
            let _ = h.manager.on_key_change(*key, move |_, _| fired.lock().unwrap().push(*key));
        }

        let pomodoro = PomodoroState {
            remaining_time: 600,
            ..h.manager.get_state().pomodoro.clone()
        };
        h.manager.set_state(StatePatch::new().pomodoro(pomodoro));

        assert_eq!(*fired.lock().unwrap(), vec![StateKey::Pomodoro]);
    }

    #[test]
    fn test_typed_key_subscriber_gets_next_and_previous_values() {
        let h = Harness::new();
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        let sub = h
            .manager
            .subscribe_to_key::<PomodoroState, _>(move |next, previous| {
                *sink.lock().unwrap() = Some((next.cycle_count, previous.cycle_count));
            });
        assert_eq!(sub.key(), Some(StateKey::Pomodoro));

        let pomodoro = PomodoroState {
            cycle_count: 3,
            ..PomodoroState::default()
        };
        h.manager.set_state(StatePatch::new().pomodoro(pomodoro));

        assert_eq!(*seen.lock().unwrap(), Some((3, 0)));
    }

    #[test]
    fn test_key_subscriber_fires_on_presence_even_if_unchanged() {
        let h = Harness::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let _ = h.manager.subscribe_to_key::<UiState, _>(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let ui = h.manager.get_state().ui.clone();
        h.manager.set_state(StatePatch::new().ui(ui.clone()));
        h.manager.set_state(StatePatch::new().ui(ui));

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_notification_order_global_then_key_then_derived() {
        let h = Harness::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let log = order.clone();
        let _ = h.manager.subscribe(move |_, _| log.lock().unwrap().push("global"));
        let log = order.clone();
        let _ = h
            .manager
            .subscribe_to_key::<FocusState, _>(move |_, _| log.lock().unwrap().push("key"));

        let log = order.clone();
        let manager = h.manager.clone();
        let _ = h.bus.on(move |event: &FileFocusChanged| {
            // Derived handlers already see the new value.
            let current = manager.get_state().focus.current_file.clone();
            assert_eq!(current.as_deref(), Some(event.file_name.as_str()));
            log.lock().unwrap().push("derived");
        });

        h.manager.set_state(StatePatch::new().focus(focus_on("main.rs")));

        assert_eq!(*order.lock().unwrap(), vec!["global", "key", "derived"]);
    }

    #[test]
    fn test_panicking_subscriber_does_not_stop_fan_out() {
        let h = Harness::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let _ = h.manager.subscribe(|_, _| panic!("subscriber failure"));
        let counter = hits.clone();
        let _ = h.manager.subscribe(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let _ = h
            .manager
            .subscribe_to_key::<FocusState, _>(|_, _| panic!("key subscriber failure"));
        let counter = hits.clone();
        let _ = h.manager.subscribe_to_key::<FocusState, _>(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let focus_events = count_events::<FileFocusChanged>(&h.bus);

        h.manager.set_state(StatePatch::new().focus(focus_on("lib.rs")));

        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(focus_events.load(Ordering::SeqCst), 1);
        assert_eq!(
            h.manager.get_state().focus.current_file.as_deref(),
            Some("lib.rs")
        );
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let h = Harness::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        let global = h.manager.subscribe(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = hits.clone();
        let keyed = h.manager.subscribe_to_key::<FocusState, _>(move |_, _| {
            counter.fetch_add(100, Ordering::SeqCst);
        });

        assert!(h.manager.unsubscribe(global));
        assert!(h.manager.unsubscribe(keyed));
        assert!(!h.manager.unsubscribe(keyed));
        assert_eq!(h.manager.subscriber_count(None), 0);
        assert_eq!(h.manager.subscriber_count(Some(StateKey::Focus)), 0);

        h.manager.set_state(StatePatch::new().focus(focus_on("a.rs")));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_get_state_returns_stable_snapshot() {
        let h = Harness::new();
        let before = h.manager.get_state();

        h.manager.set_state(StatePatch::new().focus(focus_on("changed.rs")));

        assert_eq!(before.focus.current_file, None);
        assert_eq!(
            h.manager.get_state().focus.current_file.as_deref(),
            Some("changed.rs")
        );
    }

    #[test]
    fn test_subscriber_may_write_again() {
        let h = Harness::new();
        let manager = h.manager.clone();
        let _ = h.manager.subscribe_to_key::<FocusState, _>(move |next, _| {
            let mut session = manager.get_state().session.clone();
            if let Some(file) = &next.current_file {
                session.files_worked.insert(file.clone());
            }
            manager.set_state(StatePatch::new().session(session));
        });

        h.manager.set_state(StatePatch::new().focus(focus_on("nested.rs")));

        assert!(h.manager.get_state().session.files_worked.contains("nested.rs"));
    }

    // ====================================================================================
    // DERIVED EVENTS
    // ====================================================================================

    #[test]
    fn test_file_focus_changed_from_nothing() {
        let h = Harness::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _ = h.bus.on(move |event: &FileFocusChanged| sink.lock().unwrap().push(event.clone()));

        h.manager.set_state(StatePatch::new().focus(focus_on("a.rs")));
        h.manager.set_state(StatePatch::new().focus(focus_on("a.rs")));
        h.manager.set_state(StatePatch::new().focus(focus_on("b.rs")));

        let events = seen.lock().unwrap().clone();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].file_name, "a.rs");
        assert_eq!(events[0].previous_file, None);
        assert_eq!(events[1].file_name, "b.rs");
        assert_eq!(events[1].previous_file.as_deref(), Some("a.rs"));
    }

    #[test]
    fn test_clearing_focus_emits_nothing() {
        let previous = AppState::initial(0);
        let mut focused = previous.clone();
        focused.focus = focus_on("a.rs");

        let patch = StatePatch::new().focus(FocusState::default());
        assert!(derive_events(&patch, &focused, 1).is_empty());
    }

    #[test]
    fn test_pomodoro_start_emits_and_stop_is_silent() {
        let h = Harness::new();
        let started = count_events::<PomodoroStarted>(&h.bus);

        let running = PomodoroState {
            is_running: true,
            ..PomodoroState::default()
        };
        h.manager.set_state(StatePatch::new().pomodoro(running.clone()));
        h.manager.set_state(StatePatch::new().pomodoro(running));
        assert_eq!(started.load(Ordering::SeqCst), 1);

        // Stopping through set_state publishes nothing; completion is
        // announced by the pomodoro helper instead.
        let stopped = PomodoroState::default();
        let patch = StatePatch::new().pomodoro(stopped.clone());
        assert!(derive_events(&patch, &h.manager.get_state(), 1).is_empty());
        h.manager.set_state(StatePatch::new().pomodoro(stopped));
        assert_eq!(started.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_deep_work_started_once_with_unrelated_key_in_patch() {
        let h = Harness::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _ = h.bus.on(move |event: &DeepWorkStarted| sink.lock().unwrap().push(event.clone()));

        let deep_work = DeepWorkState {
            active: true,
            start_time: Some(1_000),
            expected_duration: 45,
            score: 0.0,
        };
        let session = SessionState {
            total_edits: 12,
            ..h.manager.get_state().session.clone()
        };
        h.manager
            .set_state(StatePatch::new().deep_work(deep_work.clone()).session(session));
        h.manager.set_state(StatePatch::new().deep_work(deep_work));

        let events = seen.lock().unwrap().clone();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].expected_duration, Some(45));
    }

    #[test]
    fn test_dashboard_open_and_close_events() {
        let h = Harness::new();
        let opened = count_events::<DashboardOpened>(&h.bus);
        let closed = count_events::<DashboardClosed>(&h.bus);

        let open = UiState {
            dashboard_open: true,
            ..UiState::default()
        };
        h.manager.set_state(StatePatch::new().ui(open.clone()));
        h.manager.set_state(StatePatch::new().ui(open));
        h.manager.set_state(StatePatch::new().ui(UiState::default()));

        assert_eq!(opened.load(Ordering::SeqCst), 1);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_derive_events_ignores_keys_absent_from_patch() {
        let mut previous = AppState::initial(0);
        previous.ui.dashboard_open = true;
        let patch = StatePatch::new().pomodoro(PomodoroState::default());

        assert!(derive_events(&patch, &previous, 5).is_empty());

        let patch = StatePatch::new().ui(UiState::default());
        assert_eq!(
            derive_events(&patch, &previous, 5),
            vec![DerivedEvent::DashboardClosed(DashboardClosed { timestamp: 5 })]
        );
    }

    // ====================================================================================
    // PERSISTENCE
    // ====================================================================================

    fn populated_state() -> AppState {
        let mut state = AppState::initial(1_700_000_000_000);
        state.focus = FocusState {
            current_file: Some("src/main.rs".to_string()),
            previous_file: Some("README.md".to_string()),
            average_score: 82.5,
            total_focus_time: 5_400,
            last_update_time: 1_700_000_100_000,
        };
        state.pomodoro.cycle_count = 2;
        state.pomodoro.total_count = 17;
        state.achievements.unlocked = vec!["first_focus".to_string(), "streak_3".to_string()];
        state.achievements.last_unlocked = Some("streak_3".to_string());
        state.xp = XpState::from_total(325);
        state.goals.done_minutes = 40;
        state.session.files_worked =
            HashSet::from(["b.rs".to_string(), "a.rs".to_string(), "c.rs".to_string()]);
        state.session.total_edits = 99;
        state
    }

    fn write_patch(state: &AppState) -> StatePatch {
        StatePatch::new()
            .focus(state.focus.clone())
            .pomodoro(state.pomodoro.clone())
            .achievements(state.achievements.clone())
            .xp(state.xp.clone())
            .deep_work(state.deep_work.clone())
            .goals(state.goals.clone())
            .ui(state.ui.clone())
            .session(state.session.clone())
    }

    #[tokio::test]
    async fn test_persist_then_load_round_trips() {
        let settings = Arc::new(CountingSettings::default());
        let writer = Harness::with_settings(settings.clone());
        let original = populated_state();
        writer.manager.set_state(write_patch(&original));
        writer.manager.persist().await;
        writer.manager.cancel_pending_write();

        let reader = Harness::with_settings(settings.clone());
        let loaded_events = count_events::<DataLoaded>(&reader.bus);
        let outcome = reader.manager.load().await;

        assert_eq!(outcome, LoadOutcome::Restored);
        assert_eq!(*reader.manager.get_state(), original);
        assert_eq!(loaded_events.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_snapshot_encodes_files_as_sorted_array() {
        let encoded = snapshot::encode(&populated_state()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();

        assert_eq!(
            value["session"]["filesWorked"],
            serde_json::json!(["a.rs", "b.rs", "c.rs"])
        );
        assert_eq!(value["schemaVersion"], 1);
        assert_eq!(value["deepWork"]["expectedDuration"], 90);
        assert_eq!(value["xp"]["xpInLevel"], 75);
    }

    #[tokio::test]
    async fn test_load_notifies_global_subscribers_without_previous() {
        let settings = Arc::new(CountingSettings::default());
        settings
            .inner
            .insert("app_state", snapshot::encode(&populated_state()).unwrap());
        let h = Harness::with_settings(settings);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _ = h.manager.subscribe(move |next, previous| {
            sink.lock().unwrap().push((next.session.total_edits, previous.is_none()));
        });

        h.manager.load().await;
        assert_eq!(*seen.lock().unwrap(), vec![(99, true)]);
    }

    #[tokio::test]
    async fn test_load_without_snapshot_keeps_defaults() {
        let h = Harness::new();
        let before = h.manager.get_state();

        assert_eq!(h.manager.load().await, LoadOutcome::Defaults);
        assert_eq!(*h.manager.get_state(), *before);
        assert_eq!(h.settings.reads(), 1);
    }

    #[tokio::test]
    async fn test_load_corrupt_snapshot_falls_back() {
        let settings = Arc::new(CountingSettings::default());
        settings.inner.insert("app_state", "{not json");
        let h = Harness::with_settings(settings.clone());
        let before = h.manager.get_state();

        assert_eq!(h.manager.load().await, LoadOutcome::Fallback);
        assert_eq!(*h.manager.get_state(), *before);

        settings.inner.insert("app_state", "[1, 2, 3]");
        assert_eq!(h.manager.load().await, LoadOutcome::Fallback);

        settings
            .inner
            .insert("app_state", r#"{"session": {"totalEdits": "many"}}"#);
        assert_eq!(h.manager.load().await, LoadOutcome::Fallback);
        assert_eq!(*h.manager.get_state(), *before);
    }

    #[tokio::test]
    async fn test_load_failing_backend_falls_back() {
        let manager = StateManager::new(
            Arc::new(EventBus::new()),
            Arc::new(Debouncer::new()),
            Arc::new(FailingSettings),
            test_store_config(),
        );
        let before = manager.get_state();

        assert_eq!(manager.load().await, LoadOutcome::Fallback);
        assert_eq!(*manager.get_state(), *before);
    }

    #[tokio::test]
    async fn test_load_old_snapshot_fills_missing_fields_with_defaults() {
        let settings = Arc::new(CountingSettings::default());
        settings.inner.insert(
            "app_state",
            r#"{
                "focus": {"currentFile": "old.rs"},
                "pomodoro": {"totalCount": 9},
                "xp": {"totalXp": 325, "level": 1, "xpInLevel": 999, "xpToNext": 1},
                "session": {"filesWorked": ["x.rs", "x.rs", "y.rs"]},
                "retiredField": true
            }"#,
        );
        let h = Harness::with_settings(settings);

        assert_eq!(h.manager.load().await, LoadOutcome::Restored);
        let state = h.manager.get_state();

        assert_eq!(state.focus.current_file.as_deref(), Some("old.rs"));
        assert_eq!(state.focus.average_score, 0.0);
        assert_eq!(state.pomodoro.total_count, 9);
        assert_eq!(state.pomodoro.remaining_time, PomodoroState::default().remaining_time);
        assert_eq!(state.deep_work, DeepWorkState::default());
        assert_eq!(state.xp, XpState::from_total(325));
        assert_eq!(
            state.session.files_worked,
            HashSet::from(["x.rs".to_string(), "y.rs".to_string()])
        );
        assert!(state.session.is_active);
        assert!(state.session.start_time > 0, "missing start time takes the live default");
    }

    #[tokio::test]
    async fn test_persist_failure_leaves_memory_intact() {
        let bus = Arc::new(EventBus::new());
        let saved = count_events::<DataSaved>(&bus);
        let manager = StateManager::new(
            bus,
            Arc::new(Debouncer::new()),
            Arc::new(FailingSettings),
            test_store_config(),
        );

        manager.set_state(StatePatch::new().focus(focus_on("kept.rs")));
        assert!(manager.try_persist().await.is_err());
        manager.persist().await;

        assert_eq!(manager.get_state().focus.current_file.as_deref(), Some("kept.rs"));
        assert_eq!(saved.load(Ordering::SeqCst), 0);
        manager.cancel_pending_write();
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_writes_persists_once() {
        let h = Harness::new();
        let saved = count_events::<DataSaved>(&h.bus);

        for edits in 0..20 {
            let session = SessionState {
                total_edits: edits,
                ..h.manager.get_state().session.clone()
            };
            h.manager.set_state(StatePatch::new().session(session));
        }
        assert!(h.manager.write_pending());
        assert_eq!(h.settings.writes(), 0);

        sleep(TEST_PERSIST_DELAY * 3).await;

        assert_eq!(h.settings.writes(), 1);
        assert_eq!(saved.load(Ordering::SeqCst), 1);
        assert!(!h.manager.write_pending());

        let stored = h.settings.inner.get("app_state").expect("snapshot written");
        let restored = snapshot::decode(&stored, &AppState::initial(0)).unwrap();
        assert_eq!(restored.session.total_edits, 19);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_writes_from_plain_thread_are_persisted_once() {
        let h = Harness::new();

        let manager = h.manager.clone();
        std::thread::spawn(move || {
            for n in 0..5 {
                manager.set_state(StatePatch::new().focus(focus_on(&format!("f{n}.rs"))));
            }
        })
        .join()
        .unwrap();

        assert!(h.manager.write_pending());
        sleep(TEST_PERSIST_DELAY * 5).await;

        assert_eq!(h.settings.writes(), 1);
        assert!(!h.manager.write_pending());
        let stored = h.settings.inner.get("app_state").expect("snapshot written");
        assert!(stored.contains("f4.rs"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_continuous_writes_flush_by_max_wait() {
        let h = Harness::new();
        let max_wait = test_store_config().persist_max_wait.unwrap();

        let mut elapsed = std::time::Duration::ZERO;
        while elapsed <= max_wait {
            let session = SessionState {
                total_edits: h.manager.get_state().session.total_edits + 1,
                ..h.manager.get_state().session.clone()
            };
            h.manager.set_state(StatePatch::new().session(session));
            sleep(TEST_PERSIST_DELAY / 2).await;
            elapsed += TEST_PERSIST_DELAY / 2;
        }

        assert!(h.settings.writes() >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deactivate_flushes_pending_write_and_stops_scheduling() {
        let h = Harness::new();
        h.manager.set_state(StatePatch::new().focus(focus_on("last.rs")));
        assert!(h.manager.write_pending());

        h.manager.deactivate().await;
        assert_eq!(h.settings.writes(), 1);

        h.manager.set_state(StatePatch::new().focus(focus_on("after.rs")));
        assert!(!h.manager.write_pending());
        sleep(TEST_PERSIST_DELAY * 10).await;
        assert_eq!(h.settings.writes(), 1);
    }

    // ====================================================================================
    // RESET
    // ====================================================================================

    #[tokio::test]
    async fn test_reset_restores_defaults_and_drops_key_subscribers() {
        let h = Harness::new();
        h.manager.set_state(write_patch(&populated_state()));

        let key_hits = Arc::new(AtomicUsize::new(0));
        let counter = key_hits.clone();
        let keyed = h.manager.subscribe_to_key::<FocusState, _>(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let resets = Arc::new(Mutex::new(Vec::new()));
        let sink = resets.clone();
        let _ = h
            .manager
            .subscribe(move |_, previous| sink.lock().unwrap().push(previous.is_none()));
        let reset_events = count_events::<DataReset>(&h.bus);

        h.manager.reset().await;

        let state = h.manager.get_state();
        assert_eq!(*state, AppState::initial(state.session.start_time));
        assert_eq!(*resets.lock().unwrap(), vec![true]);
        assert_eq!(reset_events.load(Ordering::SeqCst), 1);
        assert_eq!(h.settings.writes(), 1);
        assert!(!h.manager.unsubscribe(keyed));

        h.manager.set_state(StatePatch::new().focus(focus_on("post-reset.rs")));
        assert_eq!(key_hits.load(Ordering::SeqCst), 0);
        h.manager.cancel_pending_write();
    }

    #[tokio::test]
    async fn test_reset_state_is_what_gets_persisted() {
        let settings = Arc::new(CountingSettings::default());
        let h = Harness::with_settings(settings.clone());
        h.manager.set_state(write_patch(&populated_state()));
        h.manager.reset().await;

        let stored = settings.inner.read("app_state").await.unwrap().unwrap();
        let restored = snapshot::decode(&stored, &AppState::initial(0)).unwrap();
        assert!(restored.session.files_worked.is_empty());
        assert_eq!(restored.xp, XpState::default());
    }

    // ====================================================================================
    // SINGLETON
    // ====================================================================================

    #[tokio::test]
    async fn test_singleton_accessor_install_and_reset() {
        let _guard = singleton_guard();
        reset_state_manager();

        let first = get_state_manager();
        assert!(Arc::ptr_eq(&first, &get_state_manager()));

        let private = StateManager::new(
            Arc::new(EventBus::new()),
            Arc::new(Debouncer::new()),
            Arc::new(MemorySettings::new()),
            test_store_config(),
        );
        let replaced = install_state_manager(private.clone()).expect("lazy instance existed");
        assert!(Arc::ptr_eq(&replaced, &first));
        assert!(Arc::ptr_eq(&get_state_manager(), &private));

        reset_state_manager();
        assert!(!Arc::ptr_eq(&get_state_manager(), &private));
        reset_state_manager();
    }
}
