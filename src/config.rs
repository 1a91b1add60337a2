use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::engine::MatchRules;
use crate::engine::matcher::{DEFAULT_ADVANCE_CHARS, DEFAULT_MAX_PENDING};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_advance_chars")]
    pub advance_chars: String,
    #[serde(default = "default_max_pending")]
    pub max_pending: usize,
    #[serde(default = "default_hint_secs")]
    pub hint_secs: u64,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_api_url() -> String {
    "http://localhost:8080".to_string()
}
fn default_theme() -> String {
    "terminal-default".to_string()
}
fn default_debounce_ms() -> u64 {
    1000
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_advance_chars() -> String {
    DEFAULT_ADVANCE_CHARS.iter().collect()
}
fn default_max_pending() -> usize {
    DEFAULT_MAX_PENDING
}
fn default_hint_secs() -> u64 {
    3
}
fn default_data_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("codetype")
        .to_string_lossy()
        .to_string()
}
fn default_log_filter() -> String {
    "codetype=info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token: None,
            theme: default_theme(),
            debounce_ms: default_debounce_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            advance_chars: default_advance_chars(),
            max_pending: default_max_pending(),
            hint_secs: default_hint_secs(),
            data_dir: default_data_dir(),
            log_filter: default_log_filter(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.validate();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("codetype")
            .join("config.toml")
    }

    /// Clamp tuning values into usable ranges after loading.
    pub fn validate(&mut self) {
        self.debounce_ms = self.debounce_ms.clamp(50, 60_000);
        self.max_pending = self.max_pending.clamp(1, 200);
        self.hint_secs = self.hint_secs.clamp(1, 60);
        self.request_timeout_secs = self.request_timeout_secs.clamp(1, 120);
        if self.advance_chars.is_empty() {
            self.advance_chars = default_advance_chars();
        }
        if self.data_dir.trim().is_empty() {
            self.data_dir = default_data_dir();
        }
    }

    pub fn match_rules(&self) -> MatchRules {
        MatchRules {
            advance_chars: self.advance_chars.chars().collect(),
            max_pending: self.max_pending,
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn hint_window(&self) -> Duration {
        Duration::from_secs(self.hint_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }
}
