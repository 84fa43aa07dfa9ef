//! Collaborator-side helpers built on the public `StateManager` and
//! `EventBus` API.
//!
//! Each helper reads a snapshot, builds the replacement sub-records, writes
//! them with one `set_state`, and publishes whatever domain event the store
//! does not derive on its own (XP, level-ups, achievements, completions).

mod achievements;
mod activity;
mod goals;
mod sessions;
pub mod xp;

pub use achievements::{is_unlocked, unlock_achievement};
pub use activity::{
    dashboard_refresh_trigger, record_edits, record_file_switch, set_dashboard_open,
    DASHBOARD_REFRESH_KEY,
};
pub use goals::{evaluate as evaluate_goals, record_focus_minutes};
pub use sessions::{complete_pomodoro, end_deep_work, start_deep_work, start_pomodoro};
pub use xp::{
    award_xp, day_xp, sync_xp_from_history, threshold_for, total_xp, xp_to_reach, DailyRecord,
};
