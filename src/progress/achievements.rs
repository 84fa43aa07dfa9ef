use crate::bus::{AchievementUnlocked, EventBus};
use crate::core::now_ms;
use crate::state::{AchievementState, StateManager, StatePatch};

/// Record `id` as unlocked. Returns `false` if it already was.
///
/// `ACHIEVEMENT_UNLOCKED` is published only on the first unlock.
pub fn unlock_achievement(manager: &StateManager, bus: &EventBus, id: &str) -> bool {
    let state = manager.get_state();
    if state.achievements.unlocked.iter().any(|unlocked| unlocked == id) {
        return false;
    }

    let timestamp = now_ms();
    let mut unlocked = state.achievements.unlocked.clone();
    unlocked.push(id.to_string());
    manager.set_state(StatePatch::new().achievements(AchievementState {
        unlocked,
        last_unlocked: Some(id.to_string()),
        last_check_time: timestamp,
    }));

    tracing::info!(achievement = id, "achievement unlocked");
    bus.emit(AchievementUnlocked {
        achievement: id.to_string(),
        timestamp,
    });
    true
}

pub fn is_unlocked(manager: &StateManager, id: &str) -> bool {
    manager
        .get_state()
        .achievements
        .unlocked
        .iter()
        .any(|unlocked| unlocked == id)
}
