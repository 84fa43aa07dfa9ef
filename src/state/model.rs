//! Composite application state and its sub-records.
//!
//! `AppState` is always fully populated. Writes replace whole sub-records
//! through a [`StatePatch`]; there is no merging below the top level.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::progress::xp::{threshold_for, xp_to_reach, BASE_THRESHOLD, THRESHOLD_STEP};

/// Default pomodoro work interval, in seconds.
pub const POMODORO_WORK_SECONDS: u32 = 25 * 60;
/// Default planned deep-work session, in minutes.
pub const DEFAULT_DEEP_WORK_MINUTES: u32 = 90;
pub const DEFAULT_FOCUS_MINUTES_TARGET: u32 = 120;
pub const DEFAULT_POMODORO_TARGET: u32 = 4;

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Top-level sub-record names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StateKey {
    Focus,
    Pomodoro,
    Achievements,
    Xp,
    DeepWork,
    Goals,
    Ui,
    Session,
}

impl StateKey {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Focus => "focus",
            Self::Pomodoro => "pomodoro",
            Self::Achievements => "achievements",
            Self::Xp => "xp",
            Self::DeepWork => "deepWork",
            Self::Goals => "goals",
            Self::Ui => "ui",
            Self::Session => "session",
        }
    }

    pub const fn all() -> &'static [StateKey] {
        &[
            StateKey::Focus,
            StateKey::Pomodoro,
            StateKey::Achievements,
            StateKey::Xp,
            StateKey::DeepWork,
            StateKey::Goals,
            StateKey::Ui,
            StateKey::Session,
        ]
    }
}

impl std::fmt::Display for StateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Sub-records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FocusState {
    pub current_file: Option<String>,
    pub previous_file: Option<String>,
    /// Rolling focus score, 0..=100.
    pub average_score: f64,
    /// Accumulated focused time in seconds.
    pub total_focus_time: u64,
    pub last_update_time: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PomodoroState {
    pub is_running: bool,
    /// Seconds left in the current interval.
    pub remaining_time: u32,
    pub cycle_count: u32,
    pub today_count: u32,
    pub total_count: u32,
}

impl Default for PomodoroState {
    fn default() -> Self {
        Self {
            is_running: false,
            remaining_time: POMODORO_WORK_SECONDS,
            cycle_count: 0,
            today_count: 0,
            total_count: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AchievementState {
    /// Unlock order is preserved.
    pub unlocked: Vec<String>,
    pub last_unlocked: Option<String>,
    pub last_check_time: i64,
}

/// Leveling progress.
///
/// Only constructible through [`XpState::from_total`], which keeps
/// `xp_in_level < xp_to_next`. Decoding re-resolves from `totalXp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "XpRecord", rename_all = "camelCase")]
pub struct XpState {
    total_xp: u64,
    level: u32,
    xp_in_level: u64,
    xp_to_next: u64,
}

impl XpState {
    /// Resolve level progress from `total_xp`.
    ///
    /// The cumulative curve is quadratic in the level, so the level is solved
    /// directly and then corrected for float rounding.
    pub fn from_total(total_xp: u64) -> Self {
        let total = u128::from(total_xp);
        let step = THRESHOLD_STEP as f64;
        let linear = BASE_THRESHOLD as f64 - step / 2.0;
        let estimate = (-linear + (linear * linear + 2.0 * step * total_xp as f64).sqrt()) / step;

        let mut level = (estimate.max(0.0) as u32).saturating_add(1);
        while level > 1 && xp_to_reach(level) > total {
            level -= 1;
        }
        while level < u32::MAX && xp_to_reach(level + 1) <= total {
            level += 1;
        }

        let xp_in_level = (total - xp_to_reach(level)) as u64;
        Self {
            total_xp,
            level,
            xp_in_level,
            xp_to_next: threshold_for(level),
        }
    }

    pub fn total_xp(&self) -> u64 {
        self.total_xp
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn xp_in_level(&self) -> u64 {
        self.xp_in_level
    }

    pub fn xp_to_next(&self) -> u64 {
        self.xp_to_next
    }

    /// Fraction of the current level completed, 0.0..1.0.
    pub fn progress(&self) -> f64 {
        self.xp_in_level as f64 / self.xp_to_next as f64
    }
}

impl Default for XpState {
    fn default() -> Self {
        Self::from_total(0)
    }
}

#[derive(Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct XpRecord {
    total_xp: u64,
}

impl From<XpRecord> for XpState {
    fn from(record: XpRecord) -> Self {
        Self::from_total(record.total_xp)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeepWorkState {
    pub active: bool,
    pub start_time: Option<i64>,
    /// Planned length in minutes.
    pub expected_duration: u32,
    pub score: f64,
}

impl Default for DeepWorkState {
    fn default() -> Self {
        Self {
            active: false,
            start_time: None,
            expected_duration: DEFAULT_DEEP_WORK_MINUTES,
            score: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GoalTargets {
    pub focus_minutes: u32,
    pub pomodoros: u32,
}

impl Default for GoalTargets {
    fn default() -> Self {
        Self {
            focus_minutes: DEFAULT_FOCUS_MINUTES_TARGET,
            pomodoros: DEFAULT_POMODORO_TARGET,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GoalFlags {
    pub focus_minutes: bool,
    pub pomodoros: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GoalsState {
    pub enabled: bool,
    pub targets: GoalTargets,
    pub done_minutes: u32,
    pub done_flags: GoalFlags,
    pub all_done: bool,
}

impl Default for GoalsState {
    fn default() -> Self {
        Self {
            enabled: true,
            targets: GoalTargets::default(),
            done_minutes: 0,
            done_flags: GoalFlags::default(),
            all_done: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UiState {
    pub dashboard_open: bool,
    pub last_refresh_time: i64,
    pub is_loading: bool,
}

/// Process-lifetime session counters.
///
/// Not serializable on its own: `files_worked` is a set in memory and is
/// encoded as a sequence only by the snapshot codec.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub start_time: i64,
    pub files_worked: HashSet<String>,
    pub total_edits: u64,
    pub total_switches: u64,
    pub is_active: bool,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub focus: FocusState,
    pub pomodoro: PomodoroState,
    pub achievements: AchievementState,
    pub xp: XpState,
    pub deep_work: DeepWorkState,
    pub goals: GoalsState,
    pub ui: UiState,
    pub session: SessionState,
}

impl AppState {
    /// Factory defaults for a process that started at `now` (ms since epoch).
    pub fn initial(now: i64) -> Self {
        Self {
            focus: FocusState {
                last_update_time: now,
                ..FocusState::default()
            },
            pomodoro: PomodoroState::default(),
            achievements: AchievementState::default(),
            xp: XpState::default(),
            deep_work: DeepWorkState::default(),
            goals: GoalsState::default(),
            ui: UiState::default(),
            session: SessionState {
                start_time: now,
                is_active: true,
                ..SessionState::default()
            },
        }
    }
}

/// A sub-record type addressable by its [`StateKey`].
pub trait StateSlice: Clone + Send + Sync + 'static {
    const KEY: StateKey;

    fn project(state: &AppState) -> &Self;
}

macro_rules! impl_slice {
    ($($ty:ty => $key:ident . $field:ident),* $(,)?) => {
        $(
            impl StateSlice for $ty {
                const KEY: StateKey = StateKey::$key;

                fn project(state: &AppState) -> &Self {
                    &state.$field
                }
            }
        )*
    };
}

impl_slice! {
    FocusState => Focus.focus,
    PomodoroState => Pomodoro.pomodoro,
    AchievementState => Achievements.achievements,
    XpState => Xp.xp,
    DeepWorkState => DeepWork.deep_work,
    GoalsState => Goals.goals,
    UiState => Ui.ui,
    SessionState => Session.session,
}

// ---------------------------------------------------------------------------
// Patch
// ---------------------------------------------------------------------------

/// Partial update applied by `StateManager::set_state`.
///
/// Each present field replaces the whole sub-record. Callers build the new
/// sub-record from the previous one (`..state.pomodoro.clone()`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatePatch {
    pub focus: Option<FocusState>,
    pub pomodoro: Option<PomodoroState>,
    pub achievements: Option<AchievementState>,
    pub xp: Option<XpState>,
    pub deep_work: Option<DeepWorkState>,
    pub goals: Option<GoalsState>,
    pub ui: Option<UiState>,
    pub session: Option<SessionState>,
}

impl StatePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focus(mut self, value: FocusState) -> Self {
        self.focus = Some(value);
        self
    }

    pub fn pomodoro(mut self, value: PomodoroState) -> Self {
        self.pomodoro = Some(value);
        self
    }

    pub fn achievements(mut self, value: AchievementState) -> Self {
        self.achievements = Some(value);
        self
    }

    pub fn xp(mut self, value: XpState) -> Self {
        self.xp = Some(value);
        self
    }

    pub fn deep_work(mut self, value: DeepWorkState) -> Self {
        self.deep_work = Some(value);
        self
    }

    pub fn goals(mut self, value: GoalsState) -> Self {
        self.goals = Some(value);
        self
    }

    pub fn ui(mut self, value: UiState) -> Self {
        self.ui = Some(value);
        self
    }

    pub fn session(mut self, value: SessionState) -> Self {
        self.session = Some(value);
        self
    }

    /// Keys present in this patch, in [`StateKey::all`] order.
    pub fn keys(&self) -> Vec<StateKey> {
        let present = [
            (StateKey::Focus, self.focus.is_some()),
            (StateKey::Pomodoro, self.pomodoro.is_some()),
            (StateKey::Achievements, self.achievements.is_some()),
            (StateKey::Xp, self.xp.is_some()),
            (StateKey::DeepWork, self.deep_work.is_some()),
            (StateKey::Goals, self.goals.is_some()),
            (StateKey::Ui, self.ui.is_some()),
            (StateKey::Session, self.session.is_some()),
        ];
        present
            .into_iter()
            .filter_map(|(key, is_present)| is_present.then_some(key))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }

    /// Shallow merge onto `state`.
    pub fn apply_to(&self, state: &mut AppState) {
        if let Some(focus) = &self.focus {
            state.focus = focus.clone();
        }
        if let Some(pomodoro) = &self.pomodoro {
            state.pomodoro = pomodoro.clone();
        }
        if let Some(achievements) = &self.achievements {
            state.achievements = achievements.clone();
        }
        if let Some(xp) = &self.xp {
            state.xp = xp.clone();
        }
        if let Some(deep_work) = &self.deep_work {
            state.deep_work = deep_work.clone();
        }
        if let Some(goals) = &self.goals {
            state.goals = goals.clone();
        }
        if let Some(ui) = &self.ui {
            state.ui = ui.clone();
        }
        if let Some(session) = &self.session {
            state.session = session.clone();
        }
    }
}
