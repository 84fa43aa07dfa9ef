//! Runtime configuration from environment variables (and `.env`).
//!
//! | variable | default |
//! |---|---|
//! | `FLOWSTATE_DATA_DIR` | `%APPDATA%/Flowstate`, `$HOME/.flowstate`, `.flowstate` |
//! | `FLOWSTATE_SETTINGS_KEY` | `app_state` |
//! | `FLOWSTATE_PERSIST_DELAY_MS` | `1000` |
//! | `FLOWSTATE_PERSIST_MAX_WAIT_MS` | `5000` (`0` disables) |

use std::path::PathBuf;
use std::time::Duration;

use crate::state::{StoreConfig, DEFAULT_PERSIST_DELAY, DEFAULT_PERSIST_MAX_WAIT, DEFAULT_SETTINGS_KEY};
use crate::AppError;

pub const DATA_DIR_VAR: &str = "FLOWSTATE_DATA_DIR";
pub const SETTINGS_KEY_VAR: &str = "FLOWSTATE_SETTINGS_KEY";
pub const PERSIST_DELAY_VAR: &str = "FLOWSTATE_PERSIST_DELAY_MS";
pub const PERSIST_MAX_WAIT_VAR: &str = "FLOWSTATE_PERSIST_MAX_WAIT_MS";

pub const DB_FILE_NAME: &str = "flowstate.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub data_dir: PathBuf,
    pub settings_key: String,
    pub persist_delay: Duration,
    pub persist_max_wait: Option<Duration>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(|name| std::env::var(name).ok()),
            settings_key: DEFAULT_SETTINGS_KEY.to_string(),
            persist_delay: DEFAULT_PERSIST_DELAY,
            persist_max_wait: Some(DEFAULT_PERSIST_MAX_WAIT),
        }
    }
}

impl CoreConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = match non_empty(&lookup, DATA_DIR_VAR) {
            Some(path) => PathBuf::from(path),
            None => default_data_dir(&lookup),
        };
        let settings_key =
            non_empty(&lookup, SETTINGS_KEY_VAR).unwrap_or_else(|| DEFAULT_SETTINGS_KEY.to_string());

        let persist_delay = match parse_millis(&lookup, PERSIST_DELAY_VAR)? {
            Some(delay) => delay,
            None => DEFAULT_PERSIST_DELAY,
        };
        let persist_max_wait = match parse_millis(&lookup, PERSIST_MAX_WAIT_VAR)? {
            Some(wait) if wait.is_zero() => None,
            Some(wait) => Some(wait),
            None => Some(DEFAULT_PERSIST_MAX_WAIT),
        };

        Ok(Self {
            data_dir,
            settings_key,
            persist_delay,
            persist_max_wait,
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            settings_key: self.settings_key.clone(),
            persist_delay: self.persist_delay,
            persist_max_wait: self.persist_max_wait,
        }
    }
}

fn non_empty<F: Fn(&str) -> Option<String>>(lookup: &F, name: &str) -> Option<String> {
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_millis<F: Fn(&str) -> Option<String>>(
    lookup: &F,
    name: &str,
) -> Result<Option<Duration>, AppError> {
    let Some(raw) = non_empty(lookup, name) else {
        return Ok(None);
    };
    raw.parse::<u64>()
        .map(|ms| Some(Duration::from_millis(ms)))
        .map_err(|e| AppError::Config(format!("{name}={raw:?} is not a millisecond count: {e}")))
}

fn default_data_dir<F: Fn(&str) -> Option<String>>(lookup: F) -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(app_data) = lookup("APPDATA") {
            return PathBuf::from(app_data).join("Flowstate");
        }
    }

    if let Some(home) = lookup("HOME") {
        return PathBuf::from(home).join(".flowstate");
    }

    if let Some(home) = lookup("USERPROFILE") {
        return PathBuf::from(home).join(".flowstate");
    }

    PathBuf::from(".flowstate")
}
