//! Editor activity: the calls an editor integration makes as the user moves
//! between files and types.

use std::sync::{Arc, Weak};
use std::time::Duration;

use crate::core::now_ms;
use crate::debounce::{DebounceOptions, Debouncer, Trigger};
use crate::state::{FocusState, SessionState, StateManager, StatePatch, UiState};

pub const DASHBOARD_REFRESH_KEY: &str = "dashboard_refresh";

/// Focus moved to `file`. Counts a switch only when the file actually changed.
pub fn record_file_switch(manager: &StateManager, file: &str) {
    let state = manager.get_state();
    if state.focus.current_file.as_deref() == Some(file) {
        return;
    }

    let mut files_worked = state.session.files_worked.clone();
    files_worked.insert(file.to_string());
    let switched = state.focus.current_file.is_some();

    manager.set_state(
        StatePatch::new()
            .focus(FocusState {
                current_file: Some(file.to_string()),
                previous_file: state.focus.current_file.clone(),
                last_update_time: now_ms(),
                ..state.focus.clone()
            })
            .session(SessionState {
                files_worked,
                total_switches: state.session.total_switches.saturating_add(u64::from(switched)),
                ..state.session.clone()
            }),
    );
}

/// `count` edits landed in `file`.
pub fn record_edits(manager: &StateManager, file: &str, count: u64) {
    if count == 0 {
        return;
    }
    let state = manager.get_state();
    let mut files_worked = state.session.files_worked.clone();
    files_worked.insert(file.to_string());

    manager.set_state(StatePatch::new().session(SessionState {
        files_worked,
        total_edits: state.session.total_edits.saturating_add(count),
        ..state.session.clone()
    }));
}

pub fn set_dashboard_open(manager: &StateManager, open: bool) {
    let state = manager.get_state();
    manager.set_state(StatePatch::new().ui(UiState {
        dashboard_open: open,
        last_refresh_time: if open { now_ms() } else { state.ui.last_refresh_time },
        ..state.ui.clone()
    }));
}

/// Coalesced dashboard refresh: each burst of calls stamps
/// `ui.last_refresh_time` once, `delay` after the last call.
pub fn dashboard_refresh_trigger(
    manager: &Arc<StateManager>,
    debouncer: &Debouncer,
    delay: Duration,
) -> Trigger<()> {
    let manager: Weak<StateManager> = Arc::downgrade(manager);
    debouncer.debounce(
        DASHBOARD_REFRESH_KEY,
        move |()| {
            let Some(manager) = manager.upgrade() else {
                return;
            };
            let state = manager.get_state();
            manager.set_state(StatePatch::new().ui(UiState {
                last_refresh_time: now_ms(),
                ..state.ui.clone()
            }));
        },
        delay,
        DebounceOptions::default(),
    )
}
