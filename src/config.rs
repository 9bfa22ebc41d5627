//! # Process settings.
//!
//! [`Settings`] is read once at startup and never changes afterwards.
//!
//! ## Sources (later wins)
//! 1. built-in defaults ([`Settings::default`]);
//! 2. `config/config.{env}.json`, if present (`env` from `ENV`, default `dev`);
//! 3. environment variables prefixed `LOGRELAY_`, `__` separating levels,
//!    e.g. `LOGRELAY_REDIS__HOST=cache.internal`.
//!
//! ## Example file
//! ```json
//! {
//!   "redis":    { "host": "localhost", "port": 6379, "db": 2 },
//!   "elastic":  { "host": "http://localhost", "port": 9200,
//!                 "indices": { "general": "logs", "info": "logs-info", "warning": "logs-warning",
//!                              "error": "logs-error", "debug": "logs-debug" } },
//!   "channels": { "general": "logs", "info": "logs:info", "warning": "logs:warning",
//!                 "error": "logs:error", "debug": "logs:debug" }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
};
use serde::{Deserialize, Serialize};

use crate::core::Config;
use crate::error::ConfigurationFault;
use crate::records::{Category, ChannelBinding, validate_bindings};

/// Environment variable selecting the settings file.
pub const ENV_VAR: &str = "ENV";
/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "LOGRELAY_";
/// Directory searched for `config.{env}.json`.
pub const CONFIG_DIR: &str = "config";

/// Top-level process settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Subscription source connection.
    pub redis: RedisSettings,
    /// Index store connection and per-category index names.
    pub elastic: ElasticSettings,
    /// Per-category channel names.
    pub channels: ChannelSettings,
    /// Runtime knobs.
    pub supervisor: SupervisorSettings,
}

/// Redis connection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisSettings {
    pub host: String,
    pub port: u16,
    /// Logical database number.
    pub db: i64,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 6379,
            db: 0,
        }
    }
}

impl RedisSettings {
    /// Connection URL, `redis://host:port/db`.
    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

/// Elasticsearch connection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElasticSettings {
    /// Scheme and host, e.g. `http://localhost`.
    pub host: String,
    pub port: u16,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Ask the store to refresh the index after each write.
    pub refresh: bool,
    pub indices: IndexSettings,
}

impl Default for ElasticSettings {
    fn default() -> Self {
        Self {
            host: "http://localhost".into(),
            port: 9200,
            timeout_secs: 10,
            refresh: true,
            indices: IndexSettings::default(),
        }
    }
}

impl ElasticSettings {
    /// Base URL, `host:port`.
    pub fn base_url(&self) -> String {
        format!("{}:{}", self.host.trim_end_matches('/'), self.port)
    }
}

/// One index name per category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub general: String,
    pub info: String,
    pub warning: String,
    pub error: String,
    pub debug: String,
}

impl IndexSettings {
    /// `(category, index)` pairs, blank names included.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &str)> {
        Category::ALL
            .into_iter()
            .map(move |c| (c, self.get(c)))
    }

    /// Index name configured for `category`.
    pub fn get(&self, category: Category) -> &str {
        match category {
            Category::General => &self.general,
            Category::Info => &self.info,
            Category::Warning => &self.warning,
            Category::Error => &self.error,
            Category::Debug => &self.debug,
        }
    }
}

/// One channel name per category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelSettings {
    /// Channel carrying every record regardless of level.
    pub general: String,
    pub info: String,
    pub warning: String,
    pub error: String,
    pub debug: String,
}

impl ChannelSettings {
    /// Channel name configured for `category`.
    pub fn get(&self, category: Category) -> &str {
        match category {
            Category::General => &self.general,
            Category::Info => &self.info,
            Category::Warning => &self.warning,
            Category::Error => &self.error,
            Category::Debug => &self.debug,
        }
    }
}

/// Runtime knobs mapped onto [`Config`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorSettings {
    /// Seconds to wait for listeners after cancellation.
    pub grace_secs: u64,
    pub bus_capacity: usize,
    pub inbox_capacity: usize,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        let cfg = Config::default();
        Self {
            grace_secs: cfg.grace.as_secs(),
            bus_capacity: cfg.bus_capacity,
            inbox_capacity: cfg.inbox_capacity,
        }
    }
}

impl From<&SupervisorSettings> for Config {
    fn from(s: &SupervisorSettings) -> Self {
        Config {
            grace: Duration::from_secs(s.grace_secs),
            bus_capacity: s.bus_capacity,
            inbox_capacity: s.inbox_capacity,
        }
    }
}

impl Settings {
    /// Loads settings for `env` from [`CONFIG_DIR`] and the environment.
    pub fn load(env: &str) -> Result<Self, ConfigurationFault> {
        Self::load_from(Path::new(CONFIG_DIR), env)
    }

    /// Loads settings for the environment named by `ENV` (default `dev`).
    pub fn load_from_env() -> Result<Self, ConfigurationFault> {
        let env = std::env::var(ENV_VAR)
            .ok()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| "dev".to_string());
        Self::load(&env)
    }

    /// Loads settings for `env` from `dir` and the environment.
    pub fn load_from(dir: &Path, env: &str) -> Result<Self, ConfigurationFault> {
        let figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Json::file(Self::file_path(dir, env)))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::from_figment(figment)
    }

    /// Extracts settings from a prepared figment.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigurationFault> {
        Ok(figment.extract()?)
    }

    /// Settings file path for `env` under `dir`.
    pub fn file_path(dir: &Path, env: &str) -> PathBuf {
        dir.join(format!("config.{env}.json"))
    }

    /// Runtime configuration for the supervisor.
    pub fn runtime(&self) -> Config {
        Config::from(&self.supervisor)
    }

    /// One validated binding per category.
    ///
    /// Every category needs its own non-blank, distinct channel.
    pub fn bindings(&self) -> Result<Vec<ChannelBinding>, ConfigurationFault> {
        let mut bindings = Vec::with_capacity(Category::ALL.len());
        for category in Category::ALL {
            let channel = self.channels.get(category).trim();
            if channel.is_empty() {
                return Err(ConfigurationFault::MissingChannel { category });
            }
            bindings.push(ChannelBinding::new(channel, category));
        }
        validate_bindings(&bindings)?;
        Ok(bindings)
    }
}
