use crate::bus::{DailyGoalsCompleted, EventBus};
use crate::core::now_ms;
use crate::state::{GoalFlags, GoalsState, StateManager, StatePatch};

/// Recompute `done_flags` and `all_done` from the counters.
///
/// The pomodoro goal reads today's completed pomodoros, which live in the
/// pomodoro sub-record.
pub fn evaluate(goals: &GoalsState, pomodoros_today: u32) -> GoalsState {
    let done_flags = GoalFlags {
        focus_minutes: goals.done_minutes >= goals.targets.focus_minutes,
        pomodoros: pomodoros_today >= goals.targets.pomodoros,
    };
    GoalsState {
        all_done: goals.enabled && done_flags.focus_minutes && done_flags.pomodoros,
        done_flags,
        ..goals.clone()
    }
}

/// Add `minutes` of focused time to today's goal.
///
/// Publishes `DAILY_GOALS_COMPLETED` when `all_done` flips to true.
pub fn record_focus_minutes(manager: &StateManager, bus: &EventBus, minutes: u32) -> GoalsState {
    let state = manager.get_state();
    let updated = GoalsState {
        done_minutes: state.goals.done_minutes.saturating_add(minutes),
        ..state.goals.clone()
    };
    let next = evaluate(&updated, state.pomodoro.today_count);
    manager.set_state(StatePatch::new().goals(next.clone()));

    if next.all_done && !state.goals.all_done {
        tracing::info!(done_minutes = next.done_minutes, "daily goals completed");
        bus.emit(DailyGoalsCompleted {
            done_minutes: next.done_minutes,
            timestamp: now_ms(),
        });
    }
    next
}
