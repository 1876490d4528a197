use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    pub telegram_bot_token: Option<String>,

    #[serde(default)]
    pub telegram_channel_id: i64,

    pub openai_api_key: Option<String>,

    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    #[serde(default = "default_openai_prompt")]
    pub openai_prompt: String,

    #[serde(default = "default_fetch_interval")]
    pub fetch_interval_minutes: u64,

    #[serde(default = "default_notify_interval")]
    pub notify_interval_minutes: u64,

    #[serde(default = "default_lookup_window")]
    pub lookup_window_hours: u64,

    #[serde(default)]
    pub filter_keywords: Vec<String>,

    #[serde(default)]
    pub sources: Vec<SourceEntry>,
}

/// A feed to register on startup if it is not already present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceEntry {
    pub name: String,
    pub feed_url: String,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("newswire");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("newswire.db").to_string_lossy().to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_openai_prompt() -> String {
    "You are a news editor. Summarize the following article in 2-3 short \
     sentences of clear, neutral language."
        .to_string()
}

fn default_fetch_interval() -> u64 {
    10
}

fn default_notify_interval() -> u64 {
    60
}

fn default_lookup_window() -> u64 {
    24
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            telegram_bot_token: None,
            telegram_channel_id: 0,
            openai_api_key: None,
            openai_model: default_openai_model(),
            openai_prompt: default_openai_prompt(),
            fetch_interval_minutes: default_fetch_interval(),
            notify_interval_minutes: default_notify_interval(),
            lookup_window_hours: default_lookup_window(),
            filter_keywords: Vec::new(),
            sources: Vec::new(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("newswire")
            .join("config.toml")
    }

    pub fn fetch_interval(&self) -> Duration {
        Duration::from_secs(self.fetch_interval_minutes * 60)
    }

    pub fn notify_interval(&self) -> Duration {
        Duration::from_secs(self.notify_interval_minutes * 60)
    }

    pub fn lookup_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.lookup_window_hours as i64)
    }
}
