//! Event kinds and their payloads.
//!
//! Single source of truth for the names published on the bus. Every kind has
//! exactly one payload type, tied together through [`Event::KIND`], so a
//! handler registered for one kind can never observe another kind's payload.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    FileFocusChanged,
    PomodoroStarted,
    PomodoroCompleted,
    DeepWorkStarted,
    DeepWorkEnded,
    DashboardOpened,
    DashboardClosed,
    DataSaved,
    DataLoaded,
    DataReset,
    AchievementUnlocked,
    XpEarned,
    LevelUp,
    DailyGoalsCompleted,
}

impl EventKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FileFocusChanged => "FILE_FOCUS_CHANGED",
            Self::PomodoroStarted => "POMODORO_STARTED",
            Self::PomodoroCompleted => "POMODORO_COMPLETED",
            Self::DeepWorkStarted => "DEEP_WORK_STARTED",
            Self::DeepWorkEnded => "DEEP_WORK_ENDED",
            Self::DashboardOpened => "DASHBOARD_OPENED",
            Self::DashboardClosed => "DASHBOARD_CLOSED",
            Self::DataSaved => "DATA_SAVED",
            Self::DataLoaded => "DATA_LOADED",
            Self::DataReset => "DATA_RESET",
            Self::AchievementUnlocked => "ACHIEVEMENT_UNLOCKED",
            Self::XpEarned => "XP_EARNED",
            Self::LevelUp => "LEVEL_UP",
            Self::DailyGoalsCompleted => "DAILY_GOALS_COMPLETED",
        }
    }

    pub const fn all() -> &'static [EventKind] {
        &[
            EventKind::FileFocusChanged,
            EventKind::PomodoroStarted,
            EventKind::PomodoroCompleted,
            EventKind::DeepWorkStarted,
            EventKind::DeepWorkEnded,
            EventKind::DashboardOpened,
            EventKind::DashboardClosed,
            EventKind::DataSaved,
            EventKind::DataLoaded,
            EventKind::DataReset,
            EventKind::AchievementUnlocked,
            EventKind::XpEarned,
            EventKind::LevelUp,
            EventKind::DailyGoalsCompleted,
        ]
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A payload type that can travel on the [`EventBus`](super::EventBus).
pub trait Event: Clone + Send + Sync + 'static {
    const KIND: EventKind;
}

macro_rules! impl_event {
    ($($payload:ty => $kind:ident),* $(,)?) => {
        $(
            impl Event for $payload {
                const KIND: EventKind = EventKind::$kind;
            }
        )*
    };
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFocusChanged {
    pub file_name: String,
    pub previous_file: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PomodoroStarted {
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroCompleted {
    pub cycle_count: u32,
    pub today_count: u32,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepWorkStarted {
    pub timestamp: i64,
    /// Planned session length in minutes.
    pub expected_duration: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepWorkEnded {
    /// Elapsed session length in milliseconds.
    pub duration: i64,
    pub focus_score: f64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardOpened {
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardClosed {
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSaved {
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataLoaded {
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataReset {
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AchievementUnlocked {
    pub achievement: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct XpEarned {
    pub amount: u64,
    pub source: String,
    pub total_xp: u64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelUp {
    pub new_level: u32,
    pub total_xp: u64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyGoalsCompleted {
    pub done_minutes: u32,
    pub timestamp: i64,
}

impl_event! {
    FileFocusChanged => FileFocusChanged,
    PomodoroStarted => PomodoroStarted,
    PomodoroCompleted => PomodoroCompleted,
    DeepWorkStarted => DeepWorkStarted,
    DeepWorkEnded => DeepWorkEnded,
    DashboardOpened => DashboardOpened,
    DashboardClosed => DashboardClosed,
    DataSaved => DataSaved,
    DataLoaded => DataLoaded,
    DataReset => DataReset,
    AchievementUnlocked => AchievementUnlocked,
    XpEarned => XpEarned,
    LevelUp => LevelUp,
    DailyGoalsCompleted => DailyGoalsCompleted,
}
