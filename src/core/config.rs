//! Configuration: TOML file + `QRV_*` env overrides + defaults.
//!
//! A missing file at the default location is not an error; an explicitly
//! named file that does not exist is. Every field is optional in the file,
//! absent fields keep their defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{QrvError, Result};

/// Full viewer configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Where the report documents live.
    pub report: ReportConfig,
    /// Where persisted view state lives.
    pub state: StateConfig,
    /// Diagnostics log destination.
    pub log: LogConfig,
    /// First-visit display defaults.
    pub display: DisplayConfig,
}

/// Location of the report dataset and history documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory containing `json/metrics.json` and the history files.
    pub dir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
        }
    }
}

/// Location of the persisted view-state slices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Directory holding one `<key>.json` file per state slice.
    pub dir: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            dir: data_dir().join("state"),
        }
    }
}

/// Diagnostics log settings. No configured file means no log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// JSONL file to append diagnostics events to.
    pub file: Option<PathBuf>,
}

/// Display defaults applied when no persisted toggle exists yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Start in one-big-table mode instead of per-section tables.
    pub one_table: bool,
    /// Start with the dashboard pane shown.
    pub dashboard: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            one_table: false,
            dashboard: true,
        }
    }
}

impl ViewerConfig {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        home_dir().join(".config").join("qrv").join("config.toml")
    }

    /// Load config from the default or an explicit path, then apply env
    /// overrides.
    ///
    /// A missing file is only an error when the path was given explicitly.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| QrvError::Io {
                path: path_buf.clone(),
                source,
            })?;
            toml::from_str::<Self>(&raw)?
        } else if path.is_some() {
            return Err(QrvError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_env_overrides_from(env_var)
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("QRV_REPORT_DIR") {
            self.report.dir = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("QRV_STATE_DIR") {
            self.state.dir = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("QRV_LOG_FILE") {
            self.log.file = Some(PathBuf::from(raw));
        }
        if let Some(raw) = lookup("QRV_SHOW_ONE_TABLE") {
            self.display.one_table = parse_env_bool("QRV_SHOW_ONE_TABLE", &raw)?;
        }
        if let Some(raw) = lookup("QRV_SHOW_DASHBOARD") {
            self.display.dashboard = parse_env_bool("QRV_SHOW_DASHBOARD", &raw)?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.report.dir.as_os_str().is_empty() {
            return Err(QrvError::InvalidConfig {
                details: "report.dir must not be empty".to_string(),
            });
        }
        if self.state.dir.as_os_str().is_empty() {
            return Err(QrvError::InvalidConfig {
                details: "state.dir must not be empty".to_string(),
            });
        }
        if let Some(file) = &self.log.file
            && file.as_os_str().is_empty()
        {
            return Err(QrvError::InvalidConfig {
                details: "log.file must not be empty when set".to_string(),
            });
        }
        Ok(())
    }
}

fn home_dir() -> PathBuf {
    env::var_os("HOME").map_or_else(
        || {
            eprintln!("[QRV-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths");
            PathBuf::from("/tmp")
        },
        PathBuf::from,
    )
}

fn data_dir() -> PathBuf {
    home_dir().join(".local").join("share").join("qrv")
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    raw.parse::<bool>().map_err(|error| QrvError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}
