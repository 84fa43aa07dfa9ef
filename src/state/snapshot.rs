//! Snapshot codec: the only place `AppState` meets its persisted JSON form.
//!
//! The snapshot mirrors `AppState` with camelCase keys. `session.filesWorked`
//! is a set in memory and a sorted array on disk. Decoding overlays the
//! persisted JSON onto the encoded factory defaults, so every field an older
//! snapshot lacks (at any depth) keeps its current default; fields it does not
//! know are ignored.

use std::collections::{BTreeSet, HashSet};

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::model::{
    AchievementState, AppState, DeepWorkState, FocusState, GoalsState, PomodoroState,
    SessionState, UiState, XpState,
};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Snapshot {
    schema_version: u32,
    focus: FocusState,
    pomodoro: PomodoroState,
    achievements: AchievementState,
    xp: XpState,
    deep_work: DeepWorkState,
    goals: GoalsState,
    ui: UiState,
    session: SessionSnapshot,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::from(&AppState::initial(0))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SessionSnapshot {
    start_time: i64,
    files_worked: Vec<String>,
    total_edits: u64,
    total_switches: u64,
    is_active: bool,
}

impl From<&AppState> for Snapshot {
    fn from(state: &AppState) -> Self {
        Self {
            schema_version: SNAPSHOT_VERSION,
            focus: state.focus.clone(),
            pomodoro: state.pomodoro.clone(),
            achievements: state.achievements.clone(),
            xp: state.xp.clone(),
            deep_work: state.deep_work.clone(),
            goals: state.goals.clone(),
            ui: state.ui.clone(),
            session: SessionSnapshot {
                start_time: state.session.start_time,
                files_worked: encode_files(&state.session.files_worked),
                total_edits: state.session.total_edits,
                total_switches: state.session.total_switches,
                is_active: state.session.is_active,
            },
        }
    }
}

impl Snapshot {
    fn into_state(self) -> AppState {
        AppState {
            focus: self.focus,
            pomodoro: self.pomodoro,
            achievements: self.achievements,
            xp: self.xp,
            deep_work: self.deep_work,
            goals: self.goals,
            ui: self.ui,
            session: SessionState {
                start_time: self.session.start_time,
                files_worked: decode_files(self.session.files_worked),
                total_edits: self.session.total_edits,
                total_switches: self.session.total_switches,
                is_active: self.session.is_active,
            },
        }
    }
}

fn encode_files(files: &HashSet<String>) -> Vec<String> {
    files.iter().cloned().collect::<BTreeSet<_>>().into_iter().collect()
}

fn decode_files(files: Vec<String>) -> HashSet<String> {
    files.into_iter().collect()
}

/// Serialize `state` to snapshot JSON.
pub fn encode(state: &AppState) -> Result<String, serde_json::Error> {
    serde_json::to_string(&Snapshot::from(state))
}

/// Parse snapshot JSON over `defaults` into a full `AppState`.
pub fn decode(raw: &str, defaults: &AppState) -> Result<AppState, serde_json::Error> {
    let persisted: Value = serde_json::from_str(raw)?;
    if !persisted.is_object() {
        return Err(serde_json::Error::custom("snapshot is not a JSON object"));
    }

    let mut merged = serde_json::to_value(Snapshot::from(defaults))?;
    overlay(&mut merged, persisted);

    let snapshot: Snapshot = serde_json::from_value(merged)?;
    if snapshot.schema_version > SNAPSHOT_VERSION {
        tracing::warn!(
            "snapshot schema v{} is newer than supported v{SNAPSHOT_VERSION}; unknown fields ignored",
            snapshot.schema_version
        );
    }
    Ok(snapshot.into_state())
}

/// Recursive object merge; anything that is not object-on-object replaces.
fn overlay(base: &mut Value, incoming: Value) {
    match (base, incoming) {
        (Value::Object(base), Value::Object(incoming)) => {
            for (key, value) in incoming {
                overlay(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (base, incoming) => *base = incoming,
    }
}
