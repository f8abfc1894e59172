//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `STRATA_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::chain::RefreshPolicy;

/// Chain and tier configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `STRATA_*` overrides on top of defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory for the disk tier. Default: `./.data`.
    pub storage_path: PathBuf,

    /// Max entries in the in-memory tier. Default: `10_000`.
    pub l1_capacity: u64,

    /// Time-to-live for in-memory entries. Default: none.
    pub l1_ttl: Option<Duration>,

    /// What to do when backfilling a faster tier fails. Default: `isolate`.
    pub refresh_policy: RefreshPolicy,

    /// Prefix applied to request keys. Default: `strata`.
    pub key_prefix: String,
}

/// Default storage directory used when `STRATA_STORAGE_PATH` is not set.
pub const DEFAULT_STORAGE_PATH: &str = "./.data";

/// Default in-memory capacity used when `STRATA_L1_CAPACITY` is not set.
pub const DEFAULT_L1_CAPACITY: u64 = 10_000;

/// Default key prefix used when `STRATA_KEY_PREFIX` is not set.
pub const DEFAULT_KEY_PREFIX: &str = "strata";

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            l1_capacity: DEFAULT_L1_CAPACITY,
            l1_ttl: None,
            refresh_policy: RefreshPolicy::default(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

impl Config {
    const ENV_STORAGE_PATH: &'static str = "STRATA_STORAGE_PATH";
    const ENV_L1_CAPACITY: &'static str = "STRATA_L1_CAPACITY";
    const ENV_L1_TTL_SECS: &'static str = "STRATA_L1_TTL_SECS";
    const ENV_REFRESH_POLICY: &'static str = "STRATA_REFRESH_POLICY";
    const ENV_KEY_PREFIX: &'static str = "STRATA_KEY_PREFIX";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let storage_path = Self::parse_path_from_env(Self::ENV_STORAGE_PATH, defaults.storage_path);
        let l1_capacity = Self::parse_capacity_from_env(defaults.l1_capacity)?;
        let l1_ttl = Self::parse_ttl_from_env()?;
        let refresh_policy = Self::parse_refresh_policy_from_env(defaults.refresh_policy)?;
        let key_prefix = Self::parse_string_from_env(Self::ENV_KEY_PREFIX, defaults.key_prefix);

        let config = Self {
            storage_path,
            l1_capacity,
            l1_ttl,
            refresh_policy,
            key_prefix,
        };
        config.validate_key_prefix()?;
        Ok(config)
    }

    /// Validates paths and basic invariants (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_path.exists() && !self.storage_path.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: self.storage_path.clone(),
            });
        }

        if self.l1_capacity == 0 {
            return Err(ConfigError::InvalidCapacity {
                value: self.l1_capacity.to_string(),
            });
        }

        if self.l1_ttl == Some(Duration::ZERO) {
            return Err(ConfigError::InvalidTtl {
                value: "0".to_string(),
            });
        }

        self.validate_key_prefix()
    }

    fn validate_key_prefix(&self) -> Result<(), ConfigError> {
        if self.key_prefix.trim().is_empty() || self.key_prefix.contains(':') {
            return Err(ConfigError::InvalidKeyPrefix {
                value: self.key_prefix.clone(),
            });
        }
        Ok(())
    }

    fn parse_capacity_from_env(default: u64) -> Result<u64, ConfigError> {
        match env::var(Self::ENV_L1_CAPACITY) {
            Ok(value) => {
                let capacity: u64 =
                    value
                        .trim()
                        .parse()
                        .map_err(|e| ConfigError::CapacityParseError {
                            value: value.clone(),
                            source: e,
                        })?;

                if capacity == 0 {
                    return Err(ConfigError::InvalidCapacity { value });
                }

                Ok(capacity)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_ttl_from_env() -> Result<Option<Duration>, ConfigError> {
        let Some(value) = env::var(Self::ENV_L1_TTL_SECS)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
        else {
            return Ok(None);
        };

        let secs: u64 = value.parse().map_err(|e| ConfigError::TtlParseError {
            value: value.clone(),
            source: e,
        })?;

        if secs == 0 {
            return Err(ConfigError::InvalidTtl { value });
        }

        Ok(Some(Duration::from_secs(secs)))
    }

    fn parse_refresh_policy_from_env(default: RefreshPolicy) -> Result<RefreshPolicy, ConfigError> {
        match env::var(Self::ENV_REFRESH_POLICY) {
            Ok(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidRefreshPolicy { value }),
            Err(_) => Ok(default),
        }
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        env::var(var_name).map(PathBuf::from).unwrap_or(default)
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name).unwrap_or(default)
    }
}
