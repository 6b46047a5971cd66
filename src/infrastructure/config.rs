use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::MINIMIZE_THRESHOLD_PX;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .0.display())]
    Missing(PathBuf),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    pub minimize_threshold_px: f64,
    pub peek_height_px: f64,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            minimize_threshold_px: MINIMIZE_THRESHOLD_PX,
            peek_height_px: 130.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    pub connection_delay_ms: u64,
    pub toast_dismiss_ms: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            connection_delay_ms: 6000,
            toast_dismiss_ms: 3000,
        }
    }
}

impl TimerConfig {
    pub fn connection_delay(&self) -> Duration {
        Duration::from_millis(self.connection_delay_ms)
    }

    pub fn toast_dismiss(&self) -> Duration {
        Duration::from_millis(self.toast_dismiss_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub symptom_max_len: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { symptom_max_len: 300 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub sheet: SheetConfig,
    pub timers: TimerConfig,
    pub search: SearchConfig,
}

impl Default for Config {
    fn default() -> Self {
        let base = env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(env::temp_dir)
            .join(".local")
            .join("share")
            .join("kokcall");
        Self {
            data_dir: base.join("records"),
            log_dir: base.join("logs"),
            sheet: SheetConfig::default(),
            timers: TimerConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl Config {
    pub fn default_path() -> PathBuf {
        env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(env::temp_dir)
            .join(".config")
            .join("kokcall")
            .join("config.toml")
    }

    /// Loads from an explicit path, or from the default path if it exists,
    /// then applies environment overrides and validates.
    ///
    /// A missing explicit path is an error; a missing default path is not.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);

        let mut config = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| ConfigError::Io {
                path: path_buf.clone(),
                source,
            })?;
            toml::from_str(&raw)?
        } else if path.is_some() {
            return Err(ConfigError::Missing(path_buf));
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(dir) = env::var_os("KOKCALL_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Ok(raw) = env::var("KOKCALL_CONNECTION_DELAY_MS") {
            self.timers.connection_delay_ms =
                raw.trim().parse().map_err(|_| ConfigError::Invalid {
                    key: "KOKCALL_CONNECTION_DELAY_MS",
                    message: format!("'{raw}' is not a whole number of milliseconds"),
                })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.sheet.minimize_threshold_px;
        if !(threshold.is_finite() && threshold > 0.0) {
            return Err(ConfigError::Invalid {
                key: "sheet.minimize_threshold_px",
                message: "must be a positive number".to_string(),
            });
        }
        if !(self.sheet.peek_height_px.is_finite() && self.sheet.peek_height_px >= 0.0) {
            return Err(ConfigError::Invalid {
                key: "sheet.peek_height_px",
                message: "must not be negative".to_string(),
            });
        }
        if self.timers.connection_delay_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "timers.connection_delay_ms",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.timers.toast_dismiss_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "timers.toast_dismiss_ms",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.search.symptom_max_len == 0 {
            return Err(ConfigError::Invalid {
                key: "search.symptom_max_len",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
