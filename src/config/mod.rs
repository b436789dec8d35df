//! User preferences stored as JSON under `<base>/config/config.json`.

use serde::{Deserialize, Deserializer, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

use crate::{
    errors::{BudgetError, Result},
    storage::json_backend::{tmp_path, write_atomic},
    utils::paths::{ensure_dir, PathResolver},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl<'de> Deserialize<'de> for Theme {
    /// Unknown theme names fall back to the default instead of failing the whole config.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(match raw.as_deref().map(str::trim) {
            Some(name) if name.eq_ignore_ascii_case("light") => Theme::Light,
            Some(name) if name.eq_ignore_ascii_case("dark") => Theme::Dark,
            Some(other) => {
                warn!(theme = other, "unknown theme, using dark");
                Theme::Dark
            }
            None => Theme::Dark,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub currency_symbol: String,
    pub theme: Theme,
    /// Rows shown in the recent-activity feed.
    pub recent_limit: usize,
    /// Rows shown in the expense history.
    pub history_limit: usize,
    pub backup_retention: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            currency_symbol: "Rs".into(),
            theme: Theme::Dark,
            recent_limit: 15,
            history_limit: 10,
            backup_retention: 5,
            data_dir: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.backup_retention == 0 {
            return Err(BudgetError::ConfigError(
                "backup_retention must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Self::from_base(PathResolver::base_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        Self::from_base(base)
    }

    fn from_base(base: PathBuf) -> Result<Self> {
        ensure_dir(&base)?;
        ensure_dir(&PathResolver::config_dir_in(&base))?;
        Ok(Self {
            path: PathResolver::config_file_in(&base),
        })
    }

    /// Reads the configuration, returning defaults when none has been saved.
    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.path)?;
        let config: Config = serde_json::from_str(&data)
            .map_err(|err| BudgetError::ConfigError(format!("{}: {err}", self.path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        config.validate()?;
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
