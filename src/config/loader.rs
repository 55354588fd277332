use crate::config::{LinkConfig, LoggingConfig, OwnerConfig, SettlementConfig, StorageConfig};
use crate::error::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub settlement: SettlementConfig,
    pub links: LinkConfig,
    pub owner: OwnerConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// `config/default` → `config/<env>` → `FBC__SECTION__KEY` environment variables.
    pub fn load(env: &str) -> Result<Self> {
        Self::load_from("config", env)
    }

    pub fn load_from(dir: &str, env: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name(&format!("{dir}/default")).required(false))
            .add_source(File::with_name(&format!("{dir}/{env}")).required(false))
            .add_source(Environment::with_prefix("FBC").prefix_separator("__").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
