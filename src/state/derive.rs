//! Derived domain events.
//!
//! A fixed table of transitions, checked once per `set_state` against only
//! the sub-records present in the patch:
//!
//! | key | transition | event |
//! |---|---|---|
//! | `focus.currentFile` | changed to a file | `FILE_FOCUS_CHANGED` |
//! | `pomodoro.isRunning` | false -> true | `POMODORO_STARTED` |
//! | `deepWork.active` | false -> true | `DEEP_WORK_STARTED` |
//! | `ui.dashboardOpen` | false -> true / true -> false | `DASHBOARD_OPENED` / `DASHBOARD_CLOSED` |
//!
//! `pomodoro.isRunning` going true -> false emits nothing here; completion is
//! published by the pomodoro collaborator itself.

use crate::bus::{
    DashboardClosed, DashboardOpened, DeepWorkStarted, EventBus, FileFocusChanged,
    PomodoroStarted,
};

use super::model::{AppState, StatePatch};

#[derive(Debug, Clone, PartialEq)]
pub enum DerivedEvent {
    FileFocusChanged(FileFocusChanged),
    PomodoroStarted(PomodoroStarted),
    DeepWorkStarted(DeepWorkStarted),
    DashboardOpened(DashboardOpened),
    DashboardClosed(DashboardClosed),
}

impl DerivedEvent {
    pub fn publish(self, bus: &EventBus) {
        match self {
            Self::FileFocusChanged(event) => bus.emit(event),
            Self::PomodoroStarted(event) => bus.emit(event),
            Self::DeepWorkStarted(event) => bus.emit(event),
            Self::DashboardOpened(event) => bus.emit(event),
            Self::DashboardClosed(event) => bus.emit(event),
        }
    }
}

/// Evaluate the transition table for `patch` against the pre-write state.
pub fn derive_events(patch: &StatePatch, previous: &AppState, timestamp: i64) -> Vec<DerivedEvent> {
    let mut events = Vec::new();

    if let Some(focus) = &patch.focus {
        if let Some(file_name) = &focus.current_file {
            if previous.focus.current_file.as_ref() != Some(file_name) {
                events.push(DerivedEvent::FileFocusChanged(FileFocusChanged {
                    file_name: file_name.clone(),
                    previous_file: previous.focus.current_file.clone(),
                    timestamp,
                }));
            }
        }
    }

    if let Some(pomodoro) = &patch.pomodoro {
        if pomodoro.is_running && !previous.pomodoro.is_running {
            events.push(DerivedEvent::PomodoroStarted(PomodoroStarted { timestamp }));
        }
    }

    if let Some(deep_work) = &patch.deep_work {
        if deep_work.active && !previous.deep_work.active {
            events.push(DerivedEvent::DeepWorkStarted(DeepWorkStarted {
                timestamp,
                expected_duration: Some(deep_work.expected_duration),
            }));
        }
    }

    if let Some(ui) = &patch.ui {
        match (previous.ui.dashboard_open, ui.dashboard_open) {
            (false, true) => events.push(DerivedEvent::DashboardOpened(DashboardOpened { timestamp })),
            (true, false) => events.push(DerivedEvent::DashboardClosed(DashboardClosed { timestamp })),
            _ => {}
        }
    }

    events
}
