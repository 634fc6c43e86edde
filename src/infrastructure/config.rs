//! Application configuration
//!
//! Sources, lowest precedence first: built-in defaults, the optional
//! `evolvr.toml` (path overridable with `EVOLVR_CONFIG`), then `EVOLVR_*`
//! environment variables using `__` between sections, e.g.
//! `EVOLVR_LIFECYCLE__GROUP_MODE=shared` or `EVOLVR_ADMIN__WHITELIST=1001,1002`.

use std::collections::HashSet;
use std::env;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::application::services::LifecyclePolicy;
use crate::domain::value_objects::GroupMode;

const DEFAULT_CONFIG_FILE: &str = "evolvr.toml";
const DEFAULT_CURRENCY_DIVISOR: u64 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub catalog: CatalogConfig,
    pub lifecycle: LifecycleConfig,
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub sqlite_path: String,
    pub max_connections: u32,
    /// How long SQLite waits on a locked database before reporting busy
    pub busy_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// JSON file with every creature definition
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LifecycleConfig {
    pub group_mode: GroupMode,
    pub max_emotion_delta: u32,
    /// Non-positive values fall back to 10
    pub currency_divisor: i64,
    pub approaching_threshold: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    #[serde(default)]
    pub whitelist: Vec<String>,
}

impl AppConfig {
    /// Load configuration from the config file and the environment
    pub fn load() -> Result<Self> {
        let path = env::var("EVOLVR_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(Some(&path), Self::environment())
    }

    /// Built-in defaults only, ignoring the config file and the process environment
    #[cfg(test)]
    pub fn defaults() -> Self {
        Self::load_from(None, Self::environment().source(Some(Default::default())))
            .expect("built-in defaults deserialize")
    }

    fn environment() -> Environment {
        Environment::with_prefix("EVOLVR")
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("admin.whitelist")
            .try_parsing(true)
    }

    fn load_from(path: Option<&str>, environment: Environment) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("server.port", 3000)?
            .set_default("store.backend", "sqlite")?
            .set_default("store.sqlite_path", "data/evolvr.db")?
            .set_default("store.max_connections", 5)?
            .set_default("store.busy_timeout_ms", 5000)?
            .set_default("catalog.path", "data/creatures.json")?
            .set_default("lifecycle.group_mode", "separate")?
            .set_default("lifecycle.max_emotion_delta", 10)?
            .set_default("lifecycle.currency_divisor", 10)?
            .set_default("lifecycle.approaching_threshold", 0.8)?
            .set_default("admin.whitelist", Vec::<String>::new())?;
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(false));
        }

        builder
            .add_source(environment)
            .build()
            .context("Failed to assemble configuration sources")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn lifecycle_policy(&self) -> LifecyclePolicy {
        let currency_divisor = u64::try_from(self.lifecycle.currency_divisor)
            .ok()
            .filter(|divisor| *divisor > 0)
            .unwrap_or(DEFAULT_CURRENCY_DIVISOR);

        LifecyclePolicy {
            group_mode: self.lifecycle.group_mode,
            max_emotion_delta: self.lifecycle.max_emotion_delta,
            currency_divisor,
            approaching_threshold: self.lifecycle.approaching_threshold,
            admin_whitelist: self
                .admin
                .whitelist
                .iter()
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect::<HashSet<_>>(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn environment(vars: &[(&str, &str)]) -> Environment {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::environment().source(Some(vars))
    }

    #[test]
    fn test_defaults_without_file_or_env() {
        let config = AppConfig::load_from(Some("does-not-exist.toml"), environment(&[])).unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(config.store.sqlite_path, "data/evolvr.db");
        assert_eq!(config.catalog.path, "data/creatures.json");
        assert_eq!(config.lifecycle.group_mode, GroupMode::Separate);
        assert_eq!(config.lifecycle.max_emotion_delta, 10);
        assert!(config.admin.whitelist.is_empty());
    }

    #[test]
    fn test_environment_overrides() {
        let config = AppConfig::load_from(
            Some("does-not-exist.toml"),
            environment(&[
                ("EVOLVR_STORE__BACKEND", "memory"),
                ("EVOLVR_LIFECYCLE__GROUP_MODE", "shared"),
                ("EVOLVR_LIFECYCLE__CURRENCY_DIVISOR", "0"),
                ("EVOLVR_ADMIN__WHITELIST", "1001,1002"),
            ]),
        )
        .unwrap();

        assert_eq!(config.store.backend, StoreBackend::Memory);

        let policy = config.lifecycle_policy();
        assert_eq!(policy.group_mode, GroupMode::Shared);
        assert_eq!(policy.currency_divisor, 10);
        assert!(policy.admin_whitelist.contains("1001"));
        assert!(policy.admin_whitelist.contains("1002"));
    }
}
