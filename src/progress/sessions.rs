//! Pomodoro and deep-work session transitions.
//!
//! Starting either session is a plain state write; the store derives the
//! `*_STARTED` events. Ending one is announced here, since the store does not
//! publish anything for a running flag going false.

use crate::bus::{DailyGoalsCompleted, DeepWorkEnded, EventBus, PomodoroCompleted};
use crate::core::now_ms;
use crate::state::{DeepWorkState, PomodoroState, StateManager, StatePatch, POMODORO_WORK_SECONDS};

use super::goals::evaluate;

/// Start a work interval. No-op if one is already running.
pub fn start_pomodoro(manager: &StateManager) {
    let state = manager.get_state();
    if state.pomodoro.is_running {
        return;
    }
    manager.set_state(StatePatch::new().pomodoro(PomodoroState {
        is_running: true,
        remaining_time: POMODORO_WORK_SECONDS,
        ..state.pomodoro.clone()
    }));
}

/// Finish the running interval: stop the timer, bump the counters and
/// publish `POMODORO_COMPLETED`. The daily goals are re-evaluated in the
/// same write, and `DAILY_GOALS_COMPLETED` follows if this pomodoro
/// finished them. Returns `false` if nothing was running.
pub fn complete_pomodoro(manager: &StateManager, bus: &EventBus) -> bool {
    let state = manager.get_state();
    if !state.pomodoro.is_running {
        return false;
    }

    let next = PomodoroState {
        is_running: false,
        remaining_time: POMODORO_WORK_SECONDS,
        cycle_count: state.pomodoro.cycle_count.saturating_add(1),
        today_count: state.pomodoro.today_count.saturating_add(1),
        total_count: state.pomodoro.total_count.saturating_add(1),
    };
    let goals = evaluate(&state.goals, next.today_count);
    manager.set_state(StatePatch::new().pomodoro(next.clone()).goals(goals.clone()));

    let timestamp = now_ms();
    bus.emit(PomodoroCompleted {
        cycle_count: next.cycle_count,
        today_count: next.today_count,
        timestamp,
    });
    if goals.all_done && !state.goals.all_done {
        tracing::info!(today_count = next.today_count, "daily goals completed");
        bus.emit(DailyGoalsCompleted {
            done_minutes: goals.done_minutes,
            timestamp,
        });
    }
    true
}

/// Begin a deep-work session planned for `expected_minutes`.
pub fn start_deep_work(manager: &StateManager, expected_minutes: u32) {
    let state = manager.get_state();
    if state.deep_work.active {
        return;
    }
    manager.set_state(StatePatch::new().deep_work(DeepWorkState {
        active: true,
        start_time: Some(now_ms()),
        expected_duration: expected_minutes,
        score: 0.0,
    }));
}

/// Close the active session with its final `focus_score` and publish
/// `DEEP_WORK_ENDED` with the elapsed milliseconds. Returns the elapsed time,
/// or `None` if no session was active.
pub fn end_deep_work(manager: &StateManager, bus: &EventBus, focus_score: f64) -> Option<i64> {
    let state = manager.get_state();
    if !state.deep_work.active {
        return None;
    }

    let timestamp = now_ms();
    let duration = state
        .deep_work
        .start_time
        .map_or(0, |start| (timestamp - start).max(0));
    manager.set_state(StatePatch::new().deep_work(DeepWorkState {
        active: false,
        start_time: None,
        score: focus_score,
        ..state.deep_work.clone()
    }));

    tracing::info!(duration_ms = duration, focus_score, "deep work ended");
    bus.emit(DeepWorkEnded {
        duration,
        focus_score,
        timestamp,
    });
    Some(duration)
}
