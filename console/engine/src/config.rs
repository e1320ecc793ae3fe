//! Runtime configuration for a console session.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Base URL of the REST backend.
    pub api_base_url: String,
    /// URL of the push notification endpoint.
    pub ws_url: String,
    /// Stable identity reported in the channel handshake.
    pub client_id: String,
    /// Default thread to open, when any.
    pub thread_id: Option<i64>,
    /// Seed configs applied per handler name after registration.
    pub handler_configs: HashMap<String, Value>,
    pub log_dir: PathBuf,
    pub log_level: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".into(),
            ws_url: "ws://127.0.0.1:8000/ws".into(),
            client_id: Uuid::new_v4().to_string(),
            thread_id: None,
            handler_configs: HashMap::new(),
            log_dir: PathBuf::from("logs"),
            log_level: "info".into(),
        }
    }
}

impl ConsoleConfig {
    /// Default config file location: `<config dir>/webdeck/console.yaml`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("webdeck")
            .join("console.yaml")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&raw)
            .with_context(|| format!("cannot parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Load from `path` when it exists, otherwise fall back to defaults.
    /// Environment overrides are applied either way.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            Self::load(path)?
        } else {
            debug!(path = %path.display(), "no config file, using defaults");
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply `WEBDECK_*` environment overrides on top of the loaded values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("WEBDECK_API_URL") {
            self.api_base_url = url;
        }
        if let Ok(url) = std::env::var("WEBDECK_WS_URL") {
            self.ws_url = url;
        }
        if let Ok(client_id) = std::env::var("WEBDECK_CLIENT_ID") {
            self.client_id = client_id;
        }
        if let Ok(thread_id) = std::env::var("WEBDECK_THREAD_ID") {
            if let Ok(thread_id) = thread_id.parse() {
                self.thread_id = Some(thread_id);
            }
        }
    }
}
