use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub mod loader;

pub use loader::AppConfig;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            path: PathBuf::from("data/fbc.owner.config.json"),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SettlementMode {
    /// Confirm against the backend over HTTP.
    Http,
    /// Accept every confirmation locally (offline mode).
    Local,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SettlementConfig {
    pub mode: SettlementMode,
    pub base_url: String,
    pub timeout_ms: u64,
    pub retries: u32,
    pub max_backoff_ms: u64,
}

impl SettlementConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Upper bound for one confirmation including every retry and backoff.
    pub fn overall_timeout(&self) -> Duration {
        let attempts = u64::from(self.retries) + 1;
        let backoff = self.max_backoff_ms.saturating_mul(u64::from(self.retries));
        Duration::from_millis(self.timeout_ms.saturating_mul(attempts).saturating_add(backoff))
    }
}

impl Default for SettlementConfig {
    fn default() -> Self {
        SettlementConfig {
            mode: SettlementMode::Local,
            base_url: "https://api.fabricbot.com".to_string(),
            timeout_ms: 10_000,  // 10 seconds
            retries: 3,
            max_backoff_ms: 5_000,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct LinkConfig {
    pub deep_link_base: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            deep_link_base: "https://t.me/your_bot".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct OwnerConfig {
    pub username: String,
}

impl Default for OwnerConfig {
    fn default() -> Self {
        OwnerConfig {
            username: "owner".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            filter: "info".to_string(),
            json: false,
        }
    }
}
