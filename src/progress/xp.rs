//! Leveling curve and XP awards.

use serde::{Deserialize, Serialize};

use crate::bus::{EventBus, LevelUp, XpEarned};
use crate::core::now_ms;
use crate::state::{StateManager, StatePatch, XpState};

/// XP needed to leave level 1.
pub const BASE_THRESHOLD: u64 = 100;
/// Extra XP needed per level after the first.
pub const THRESHOLD_STEP: u64 = 50;

/// XP needed to advance from `level` to `level + 1`.
pub fn threshold_for(level: u32) -> u64 {
    BASE_THRESHOLD + u64::from(level.saturating_sub(1)) * THRESHOLD_STEP
}

/// Cumulative XP needed to reach `level` from zero.
pub fn xp_to_reach(level: u32) -> u128 {
    let completed = u128::from(level.saturating_sub(1));
    completed * u128::from(BASE_THRESHOLD)
        + u128::from(THRESHOLD_STEP) * completed * completed.saturating_sub(1) / 2
}

/// One day of focus history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRecord {
    /// `YYYY-MM-DD`
    pub date: String,
    pub minutes: u32,
    /// 0..=100
    pub average_score: f64,
}

/// XP earned on one day: `minutes * (score / 100) * 10`.
pub fn day_xp(record: &DailyRecord) -> f64 {
    f64::from(record.minutes) * (record.average_score.max(0.0) / 100.0) * 10.0
}

/// Floored sum of [`day_xp`] over `records`.
pub fn total_xp<'a>(records: impl IntoIterator<Item = &'a DailyRecord>) -> u64 {
    records.into_iter().map(day_xp).sum::<f64>().floor() as u64
}

/// Add `amount` XP. Emits `XP_EARNED`, then `LEVEL_UP` if the level rose.
pub fn award_xp(manager: &StateManager, bus: &EventBus, amount: u64, source: &str) -> XpState {
    let previous = manager.get_state().xp.clone();
    let next = XpState::from_total(previous.total_xp().saturating_add(amount));
    apply(manager, bus, &previous, next.clone(), amount, source);
    next
}

/// Recompute XP from the full history, replacing the running total.
///
/// Emits `XP_EARNED` only when the total grew.
pub fn sync_xp_from_history(
    manager: &StateManager,
    bus: &EventBus,
    records: &[DailyRecord],
) -> XpState {
    let previous = manager.get_state().xp.clone();
    let next = XpState::from_total(total_xp(records));
    if next == previous {
        return next;
    }

    let gained = next.total_xp().saturating_sub(previous.total_xp());
    apply(manager, bus, &previous, next.clone(), gained, "history");
    next
}

fn apply(
    manager: &StateManager,
    bus: &EventBus,
    previous: &XpState,
    next: XpState,
    gained: u64,
    source: &str,
) {
    manager.set_state(StatePatch::new().xp(next.clone()));

    let timestamp = now_ms();
    if gained > 0 {
        bus.emit(XpEarned {
            amount: gained,
            source: source.to_string(),
            total_xp: next.total_xp(),
            timestamp,
        });
    }
    if next.level() > previous.level() {
        tracing::info!(level = next.level(), "level up");
        bus.emit(LevelUp {
            new_level: next.level(),
            total_xp: next.total_xp(),
            timestamp,
        });
    }
}
