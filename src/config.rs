use crate::{
    error::{AgendaError, AgendaResult},
    reminder::{DEFAULT_OFFSET_MINUTES, DEFAULT_TITLE, PastTriggerPolicy, Permission, ReminderSettings},
};
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use time::Duration;

pub const CONFIG_ENV: &str = "AGENDA_CONFIG";

/// One year.
pub const MAX_OFFSET_MINUTES: i64 = 525_600;

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding `appointments.json` and `reminders.json`.
    pub data_dir: PathBuf,
    pub reminder_offset: Duration,
    pub past_reminders: PastTriggerPolicy,
    /// Whether reminders may be delivered at all.
    pub notifications: bool,
    pub reminder_title: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    data_dir: Option<PathBuf>,
    reminder_offset_minutes: Option<i64>,
    past_reminders: Option<PastTriggerPolicy>,
    notifications: Option<bool>,
    reminder_title: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_file(FileConfig::default())
    }
}

impl Config {
    /// Reads `$AGENDA_CONFIG`, or `<config_dir>/agenda/config.toml`, falling back to defaults
    /// when the file does not exist.
    pub fn load() -> AgendaResult<Self> {
        let Some(path) = Self::config_path() else {
            return Ok(Self::default());
        };

        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> AgendaResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| AgendaError::Config(format!("reading {}: {e}", path.display())))?;

        Self::parse(&text).map_err(|e| AgendaError::Config(format!("parsing {}: {e}", path.display())))
    }

    pub fn parse(text: &str) -> AgendaResult<Self> {
        let file: FileConfig = toml::from_str(text).map_err(|e| AgendaError::Config(e.to_string()))?;

        if let Some(minutes) = file
            .reminder_offset_minutes
            .filter(|minutes| !(0..=MAX_OFFSET_MINUTES).contains(minutes))
        {
            return Err(AgendaError::Config(format!(
                "reminder_offset_minutes must be between 0 and {MAX_OFFSET_MINUTES}, got {minutes}"
            )));
        }

        Ok(Self::from_file(file))
    }

    pub fn config_path() -> Option<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }

        dirs::config_dir().map(|dir| dir.join("agenda").join("config.toml"))
    }

    /// `<data_dir>/agenda`, or `./agenda` when the platform has no data directory.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .map(|dir| dir.join("agenda"))
            .unwrap_or_else(|| PathBuf::from("./agenda"))
    }

    pub fn permission(&self) -> Permission {
        if self.notifications {
            Permission::Granted
        } else {
            Permission::Denied
        }
    }

    pub fn reminder_settings(&self) -> ReminderSettings {
        ReminderSettings {
            offset: self.reminder_offset,
            policy: self.past_reminders,
            title: self.reminder_title.clone(),
        }
    }

    fn from_file(file: FileConfig) -> Self {
        Self {
            data_dir: file.data_dir.unwrap_or_else(Self::default_data_dir),
            reminder_offset: Duration::minutes(file.reminder_offset_minutes.unwrap_or(DEFAULT_OFFSET_MINUTES)),
            past_reminders: file.past_reminders.unwrap_or_default(),
            notifications: file.notifications.unwrap_or(true),
            reminder_title: file.reminder_title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        }
    }
}
