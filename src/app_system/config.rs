//! Configuration loading from files and environment.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::domain::FeeSchedule;
use crate::error::ConfigError;
use crate::ledger::LedgerPolicy;

pub const MIN_POLL_INTERVAL_MS: u64 = 500;
pub const MAX_POLL_INTERVAL_MS: u64 = 60_000;

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub fees: FeeSchedule,
    pub ledger: LedgerPolicy,
    pub polling: PollingConfig,
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub advisor: AdvisorConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_ms: 4000 }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub buffer_size: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self { buffer_size: 64 }
    }
}

/// Where collections live. No directory means an in-memory store.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct AdvisorConfig {
    pub api_key: Option<String>,
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
        let path = path.as_ref();
        info!("Loading configuration from {:?}", path);

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml(&contents)?;
        Self::validate(&config)?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<AppConfig, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(format!("Failed to parse TOML: {}", e)))
    }

    /// Defaults or the given file, then environment overrides.
    pub fn from_env_and_file(file_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
        let mut config = match file_path {
            Some(path) => Self::from_file(path)?,
            None => AppConfig::default(),
        };
        Self::apply_overrides(&mut config, |key| std::env::var(key).ok())?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Applies `AXLE_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("AXLE_DEBT_LIMIT") {
            debug!("Overriding debt limit from environment");
            config.ledger.debt_limit = parse_amount("AXLE_DEBT_LIMIT", &value)?;
        }
        if let Some(value) = lookup("AXLE_DELIVERY_FEE") {
            debug!("Overriding delivery fee from environment");
            config.fees.delivery_fee = parse_amount("AXLE_DELIVERY_FEE", &value)?;
        }
        if let Some(value) = lookup("AXLE_PLATFORM_FEE") {
            debug!("Overriding platform fee from environment");
            config.fees.platform_fee = parse_amount("AXLE_PLATFORM_FEE", &value)?;
        }
        if let Some(value) = lookup("AXLE_POLL_INTERVAL_MS") {
            debug!("Overriding poll interval from environment");
            config.polling.interval_ms = value
                .trim()
                .parse()
                .map_err(|e| ConfigError::Parse(format!("AXLE_POLL_INTERVAL_MS: {}", e)))?;
        }
        if let Some(value) = lookup("AXLE_STORAGE_DIR") {
            debug!("Overriding storage directory from environment");
            config.storage.dir = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup("AXLE_AI_API_KEY") {
            debug!("Overriding advisor API key from environment");
            config.advisor.api_key = Some(value).filter(|k| !k.trim().is_empty());
        }
        Ok(())
    }

    pub fn validate(config: &AppConfig) -> Result<(), ConfigError> {
        if config.fees.delivery_fee < Decimal::ZERO || config.fees.platform_fee < Decimal::ZERO {
            return Err(ConfigError::ValidationError("Fees must not be negative".to_string()));
        }
        if config.ledger.debt_limit < Decimal::ZERO {
            return Err(ConfigError::ValidationError("Debt limit must not be negative".to_string()));
        }
        if !(MIN_POLL_INTERVAL_MS..=MAX_POLL_INTERVAL_MS).contains(&config.polling.interval_ms) {
            return Err(ConfigError::ValidationError(format!(
                "Poll interval must be between {} and {} ms, got {}",
                MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS, config.polling.interval_ms
            )));
        }
        if config.service.buffer_size == 0 {
            return Err(ConfigError::ValidationError("Service buffer must be positive".to_string()));
        }
        Ok(())
    }
}

fn parse_amount(key: &str, value: &str) -> Result<Decimal, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::Parse(format!("{}: {}", key, e)))
}

/// Loads `.env`, then the file named by `AXLE_CONFIG` or `./axle.toml` if
/// present, then environment overrides.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    if dotenv::dotenv().is_ok() {
        debug!("Loaded .env file");
    }

    if let Ok(path) = std::env::var("AXLE_CONFIG") {
        return ConfigLoader::from_env_and_file(Some(Path::new(&path)));
    }
    let default_path = Path::new("./axle.toml");
    if default_path.exists() {
        return ConfigLoader::from_env_and_file(Some(default_path));
    }
    ConfigLoader::from_env_and_file(None)
}
