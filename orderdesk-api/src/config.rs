use crate::auth::ApiKeys;
use crate::error::{AppError, ConfigError, Result};
use serde::Deserialize;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

fn default_bind() -> String {
    "[::]:8000".into()
}

fn default_workers() -> usize {
    4
}

fn default_connection_rate() -> usize {
    256
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./data/temp/order-management.db")
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
    #[serde(default = "default_bind")]
    pub(crate) bind: String,
    #[serde(default = "default_workers")]
    pub(crate) workers: usize,
    #[serde(default = "default_connection_rate")]
    pub(crate) max_connection_rate: usize,

    /// Directory holding `customers.json`, `orders.json`, ...
    #[serde(default = "default_data_dir")]
    pub(crate) data_dir: PathBuf,
    /// SQLite file the snapshots are imported into
    #[serde(default = "default_database_path")]
    pub(crate) database_path: PathBuf,

    /// Accepted `X-API-Key` values; empty disables the check
    #[serde(default)]
    pub(crate) api_keys: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            workers: default_workers(),
            max_connection_rate: default_connection_rate(),
            data_dir: default_data_dir(),
            database_path: default_database_path(),
            api_keys: Vec::new(),
        }
    }
}

impl Config {
    pub(crate) fn load(settings_file: &Path) -> Result<Config> {
        let contents = read_to_string(settings_file).map_err(|e| ConfigError::ReadFile {
            path: settings_file.display().to_string(),
            source: e,
        })?;
        Self::parse(&contents)
    }

    pub(crate) fn parse(contents: &str) -> Result<Config> {
        toml::from_str(contents).map_err(|e| AppError::from(ConfigError::from(e)))
    }

    pub(crate) fn api_keys(&self) -> ApiKeys {
        ApiKeys::new(self.api_keys.iter().cloned())
    }

    /// Apply environment overrides and check invariants.
    fn finish(mut self, env: impl Fn(&str) -> Option<String>) -> Result<Config> {
        if let Some(data_dir) = env("ORDERDESK_DATA_DIR") {
            self.data_dir = PathBuf::from(data_dir);
        }
        if let Some(database_path) = env("ORDERDESK_DATABASE_PATH") {
            self.database_path = PathBuf::from(database_path);
        }
        if let Some(api_key) = env("ORDERDESK_API_KEY").filter(|key| !key.is_empty()) {
            self.api_keys.push(api_key);
        }

        if self.workers == 0 {
            return Err(ConfigError::Invalid {
                reason: "workers must be greater than 0".to_string(),
            }
            .into());
        }
        if self.api_keys.iter().any(|key| key.is_empty()) {
            return Err(ConfigError::Invalid {
                reason: "api_keys must not contain empty keys".to_string(),
            }
            .into());
        }
        Ok(self)
    }
}

pub(crate) fn load() -> Result<Config> {
    let settings = match std::env::var("CONFIG_FILE") {
        Err(_) => {
            if Path::new("settings.toml").exists() {
                Config::load(Path::new("settings.toml"))?
            } else {
                Config::default()
            }
        }
        Ok(settings_file) => Config::load(Path::new(&settings_file))?,
    };
    settings.finish(|name| std::env::var(name).ok())
}
