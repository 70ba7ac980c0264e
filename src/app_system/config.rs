use std::path::PathBuf;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

pub const DEFAULT_SLOT_KEY: &str = "dearlilian_orders";

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub actor: ActorConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct StorageConfig {
    /// Directory holding `<key>.json`.
    pub dir: PathBuf,
    pub key: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ActorConfig {
    pub buffer_size: usize,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LogConfig {
    pub filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                dir: PathBuf::from("data"),
                key: DEFAULT_SLOT_KEY.to_string(),
            },
            actor: ActorConfig { buffer_size: 32 },
            log: LogConfig {
                filter: "info".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Defaults, then `config/default.*` if present, then `LILIAN_*`
    /// variables (`LILIAN_STORAGE__DIR=/var/lib/lilian`).
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(Environment::with_prefix("LILIAN").prefix_separator("_").separator("__").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let defaults = Self::default();
        Config::builder()
            .set_default("storage.dir", defaults.storage.dir.to_string_lossy().into_owned())?
            .set_default("storage.key", defaults.storage.key)?
            .set_default("actor.buffer_size", defaults.actor.buffer_size as i64)?
            .set_default("log.filter", defaults.log.filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_sources() {
        let config: AppConfig = AppConfig::builder().unwrap().build().unwrap().try_deserialize().unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.storage.key, "dearlilian_orders");
    }

    #[test]
    fn test_sources_override_defaults() {
        let config: AppConfig = AppConfig::builder()
            .unwrap()
            .set_override("storage.dir", "/tmp/lilian")
            .unwrap()
            .set_override("actor.buffer_size", 4_i64)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.storage.dir, PathBuf::from("/tmp/lilian"));
        assert_eq!(config.actor.buffer_size, 4);
        assert_eq!(config.log.filter, "info");
    }
}
