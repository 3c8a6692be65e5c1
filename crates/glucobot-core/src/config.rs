use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{GlucobotError, Result};

/// Total notification window in seconds, unless configured otherwise.
pub const DEFAULT_REMINDER_DURATION_SECS: u64 = 30;
/// Gap between repeated sends in seconds, unless configured otherwise.
pub const DEFAULT_REMINDER_INTERVAL_SECS: u64 = 1;

/// Top-level config (`glucobot.toml` + `GLUCOBOT_*` env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlucobotConfig {
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub reminder: ReminderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token. Override with `GLUCOBOT_TELEGRAM_TOKEN`.
    pub token: String,
}

/// Notification loop timing. Fixed at process start, shared by every chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    /// Total notification window in seconds.
    #[serde(default = "default_duration")]
    pub duration: u64,
    /// Gap between repeated sends in seconds.
    #[serde(default = "default_interval")]
    pub interval: u64,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            duration: default_duration(),
            interval: default_interval(),
        }
    }
}

fn default_duration() -> u64 {
    DEFAULT_REMINDER_DURATION_SECS
}

fn default_interval() -> u64 {
    DEFAULT_REMINDER_INTERVAL_SECS
}

impl GlucobotConfig {
    /// Load config: explicit path > `./glucobot.toml`, then env overrides.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path.unwrap_or("glucobot.toml");
        Self::from_figment(
            Figment::new()
                .merge(Toml::file(path))
                .merge(Env::prefixed("GLUCOBOT_").split("_")),
        )
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let config: GlucobotConfig = figment
            .extract()
            .map_err(|e| GlucobotError::Config(e.to_string()))?;
        if config.telegram.token.trim().is_empty() {
            return Err(GlucobotError::Config(
                "telegram token must not be empty".to_string(),
            ));
        }
        Ok(config)
    }
}
