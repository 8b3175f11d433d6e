//! Tracker settings.
//!
//! Layered as compiled-in defaults, then an optional JSON file named by
//! `FIFTY_FIFTY_CONFIG_PATH`, then per-key values from the host's config store.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use budget_schema::CONFIG_GROUP;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::discovery::{DiscoverySettings, DEFAULT_NEW_MONSTER_COOLDOWN_SECS};
use crate::registry::{RegistrySettings, DEFAULT_KILL_THRESHOLD};
use crate::store::ConfigStore;

pub const CONFIG_PATH_ENV: &str = "FIFTY_FIFTY_CONFIG_PATH";

pub const HIDE_ATTACK_OPTION_KEY: &str = "hideAttackOption";
pub const USE_GLOBAL_THRESHOLDS_KEY: &str = "useGlobalThresholds";
pub const DEFAULT_KILL_THRESHOLD_KEY: &str = "defaultKillThreshold";
pub const BATCH_MODE_KEY: &str = "batchModeEnabled";
pub const SHOW_RECENT_KILL_OVERLAY_KEY: &str = "showRecentKillOverlay";
pub const RESET_KILLS_KEY: &str = "resetKills";
pub const RESET_CUSTOM_MONSTERS_KEY: &str = "resetCustomMonsters";

const MIN_DEFAULT_THRESHOLD: u32 = 1;
const MAX_DEFAULT_THRESHOLD: u32 = 1000;
const DEFAULT_RECENT_KILL_DISPLAY_SECS: u64 = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    hide_attack_option: bool,
    use_global_thresholds: bool,
    default_kill_threshold: u32,
    batch_mode_enabled: bool,
    new_monster_cooldown_secs: u64,
    show_recent_kill_overlay: bool,
    recent_kill_display_secs: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            hide_attack_option: true,
            use_global_thresholds: true,
            default_kill_threshold: DEFAULT_KILL_THRESHOLD,
            batch_mode_enabled: false,
            new_monster_cooldown_secs: DEFAULT_NEW_MONSTER_COOLDOWN_SECS,
            show_recent_kill_overlay: true,
            recent_kill_display_secs: DEFAULT_RECENT_KILL_DISPLAY_SECS,
        }
    }
}

#[derive(Debug, Error)]
pub enum TrackerConfigError {
    #[error("failed to parse tracker config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read tracker config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid value '{value}' for config key '{key}'")]
    InvalidValue { key: String, value: String },
}

/// What a config-changed event amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigUpdate {
    /// A live setting changed; `key` is the store key.
    Setting { key: &'static str },
    ResetKills,
    ResetCustomMonsters,
    /// Unknown key, or a trigger set back to false.
    Ignored,
}

impl TrackerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, TrackerConfigError> {
        let config: TrackerConfig = serde_json::from_str(json)?;
        Ok(config.normalized())
    }

    pub fn from_file(path: &Path) -> Result<Self, TrackerConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| TrackerConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        TrackerConfig::from_json_str(&contents)
    }

    fn normalized(mut self) -> Self {
        self.default_kill_threshold = self
            .default_kill_threshold
            .clamp(MIN_DEFAULT_THRESHOLD, MAX_DEFAULT_THRESHOLD);
        self
    }

    pub fn hide_attack_option(&self) -> bool {
        self.hide_attack_option
    }

    pub fn use_global_thresholds(&self) -> bool {
        self.use_global_thresholds
    }

    pub fn default_kill_threshold(&self) -> u32 {
        self.default_kill_threshold
    }

    pub fn batch_mode_enabled(&self) -> bool {
        self.batch_mode_enabled
    }

    pub fn new_monster_cooldown_secs(&self) -> u64 {
        self.new_monster_cooldown_secs
    }

    pub fn show_recent_kill_overlay(&self) -> bool {
        self.show_recent_kill_overlay
    }

    pub fn recent_kill_display_ms(&self) -> u64 {
        self.recent_kill_display_secs.saturating_mul(1000)
    }

    pub fn registry_settings(&self) -> RegistrySettings {
        RegistrySettings {
            default_threshold: self.default_kill_threshold,
            use_catalog: self.use_global_thresholds,
        }
    }

    pub fn discovery_settings(&self) -> DiscoverySettings {
        DiscoverySettings {
            batch_mode: self.batch_mode_enabled,
            cooldown_secs: self.new_monster_cooldown_secs,
        }
    }

    /// Apply one key from the host's config group. A missing value reads as unset
    /// and leaves the setting alone.
    pub fn apply_change(
        &mut self,
        key: &str,
        value: Option<&str>,
    ) -> Result<ConfigUpdate, TrackerConfigError> {
        let Some(value) = value.map(str::trim) else {
            return Ok(ConfigUpdate::Ignored);
        };
        match key {
            HIDE_ATTACK_OPTION_KEY => {
                self.hide_attack_option = parse_bool(key, value)?;
                Ok(ConfigUpdate::Setting {
                    key: HIDE_ATTACK_OPTION_KEY,
                })
            }
            USE_GLOBAL_THRESHOLDS_KEY => {
                self.use_global_thresholds = parse_bool(key, value)?;
                Ok(ConfigUpdate::Setting {
                    key: USE_GLOBAL_THRESHOLDS_KEY,
                })
            }
            DEFAULT_KILL_THRESHOLD_KEY => {
                let threshold: u32 = value.parse().map_err(|_| invalid(key, value))?;
                self.default_kill_threshold =
                    threshold.clamp(MIN_DEFAULT_THRESHOLD, MAX_DEFAULT_THRESHOLD);
                Ok(ConfigUpdate::Setting {
                    key: DEFAULT_KILL_THRESHOLD_KEY,
                })
            }
            BATCH_MODE_KEY => {
                self.batch_mode_enabled = parse_bool(key, value)?;
                Ok(ConfigUpdate::Setting {
                    key: BATCH_MODE_KEY,
                })
            }
            SHOW_RECENT_KILL_OVERLAY_KEY => {
                self.show_recent_kill_overlay = parse_bool(key, value)?;
                Ok(ConfigUpdate::Setting {
                    key: SHOW_RECENT_KILL_OVERLAY_KEY,
                })
            }
            RESET_KILLS_KEY if parse_bool(key, value)? => Ok(ConfigUpdate::ResetKills),
            RESET_CUSTOM_MONSTERS_KEY if parse_bool(key, value)? => {
                Ok(ConfigUpdate::ResetCustomMonsters)
            }
            _ => Ok(ConfigUpdate::Ignored),
        }
    }

    /// Overlay every live setting the store holds a value for.
    pub fn apply_store(&mut self, store: &dyn ConfigStore) {
        for key in [
            HIDE_ATTACK_OPTION_KEY,
            USE_GLOBAL_THRESHOLDS_KEY,
            DEFAULT_KILL_THRESHOLD_KEY,
            BATCH_MODE_KEY,
            SHOW_RECENT_KILL_OVERLAY_KEY,
        ] {
            let value = store.get(CONFIG_GROUP, key);
            if let Err(err) = self.apply_change(key, value.as_deref()) {
                tracing::warn!(
                    target: "fifty_fifty::config",
                    key,
                    error = %err,
                    "tracker_config.store_value_ignored"
                );
            }
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, TrackerConfigError> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(invalid(key, value))
    }
}

fn invalid(key: &str, value: &str) -> TrackerConfigError {
    TrackerConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Defaults, then `FIFTY_FIFTY_CONFIG_PATH` when set, then the store's values.
pub fn load_tracker_config(store: &dyn ConfigStore) -> TrackerConfig {
    let mut config = match env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from) {
        Some(path) => match TrackerConfig::from_file(&path) {
            Ok(config) => {
                tracing::info!(
                    target: "fifty_fifty::config",
                    path = %path.display(),
                    "tracker_config.loaded=file"
                );
                config
            }
            Err(err) => {
                tracing::warn!(
                    target: "fifty_fifty::config",
                    path = %path.display(),
                    error = %err,
                    "tracker_config.load_failed"
                );
                TrackerConfig::default()
            }
        },
        None => TrackerConfig::default(),
    };
    config.apply_store(store);
    config
}
