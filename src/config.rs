//! Host configuration loading: storage location, gameplay defaults and session policy.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    dao::app_store::DEFAULT_STORAGE_KEY,
    dto::game::TIMER_MAX_SECONDS,
    state::game::{DEFAULT_QUESTION_TIMER_SECONDS, DEFAULT_TEAM_A, DEFAULT_TEAM_B, Teams},
};

/// Default location on disk where the host looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "GAMESHOW_HOST_CONFIG_PATH";
/// Directory holding the persisted application blob.
const DEFAULT_DATA_DIR: &str = "data";
/// Typical browser local-storage budget.
const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;
const DEFAULT_TRANSITION_TIMEOUT_MS: u64 = 5_000;

/// Whether a question may be closed without playing it before its answer is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitPolicy {
    /// Exiting to the board is allowed at any time.
    #[default]
    AnyTime,
    /// Exiting to the board is only allowed once the answer is revealed.
    AfterReveal,
}

/// Values applied to newly created games.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameDefaults {
    /// Team names given to a new game.
    pub teams: Teams,
    /// Countdown of a new game, `0` disables it.
    pub question_timer_seconds: u32,
}

impl Default for GameDefaults {
    fn default() -> Self {
        Self {
            teams: Teams::default(),
            question_timer_seconds: DEFAULT_QUESTION_TIMER_SECONDS,
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the host.
pub struct HostConfig {
    /// Directory of the file blob store.
    pub data_dir: PathBuf,
    /// Key the application blob is stored under.
    pub storage_key: String,
    /// Largest blob the file store accepts, `None` for unlimited.
    pub quota_bytes: Option<usize>,
    /// Values given to newly created games.
    pub game_defaults: GameDefaults,
    /// Applied to every session started on this host.
    pub exit_policy: ExitPolicy,
    /// Upper bound for persisting a transition, `None` waits forever.
    pub transition_timeout: Option<Duration>,
}

impl HostConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(path = %path.display(), "loaded host configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a configuration document; absent keys keep their defaults.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            storage_key: DEFAULT_STORAGE_KEY.into(),
            quota_bytes: Some(DEFAULT_QUOTA_BYTES),
            game_defaults: GameDefaults::default(),
            exit_policy: ExitPolicy::default(),
            transition_timeout: Some(Duration::from_millis(DEFAULT_TRANSITION_TIMEOUT_MS)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    data_dir: Option<PathBuf>,
    storage_key: Option<String>,
    /// `0` lifts the quota.
    quota_bytes: Option<usize>,
    question_timer_seconds: Option<u32>,
    team_names: Option<RawTeamNames>,
    exit_policy: Option<ExitPolicy>,
    /// `0` disables the timeout.
    transition_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTeamNames {
    team_a: Option<String>,
    team_b: Option<String>,
}

impl From<RawConfig> for HostConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = HostConfig::default();
        let teams = match value.team_names {
            Some(names) => Teams {
                team_a: names.team_a.unwrap_or_else(|| DEFAULT_TEAM_A.into()),
                team_b: names.team_b.unwrap_or_else(|| DEFAULT_TEAM_B.into()),
            },
            None => Teams::default(),
        };

        Self {
            data_dir: value.data_dir.unwrap_or(defaults.data_dir),
            storage_key: value.storage_key.unwrap_or(defaults.storage_key),
            quota_bytes: match value.quota_bytes {
                Some(0) => None,
                Some(limit) => Some(limit),
                None => defaults.quota_bytes,
            },
            game_defaults: GameDefaults {
                teams,
                question_timer_seconds: match value.question_timer_seconds {
                    Some(seconds) if seconds > TIMER_MAX_SECONDS => {
                        warn!(
                            seconds,
                            max = TIMER_MAX_SECONDS,
                            "configured question timer out of range; using default"
                        );
                        DEFAULT_QUESTION_TIMER_SECONDS
                    }
                    Some(seconds) => seconds,
                    None => DEFAULT_QUESTION_TIMER_SECONDS,
                },
            },
            exit_policy: value.exit_policy.unwrap_or_default(),
            transition_timeout: match value.transition_timeout_ms {
                Some(0) => None,
                Some(ms) => Some(Duration::from_millis(ms)),
                None => defaults.transition_timeout,
            },
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
