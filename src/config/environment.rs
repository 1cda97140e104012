// ABOUTME: Environment configuration for stores, leveling policy and durable-write retry
// ABOUTME: Parses ASCEND_* variables with logged fallbacks to defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

//! Environment-based configuration

use crate::constants::levels::{
    DEFAULT_GEOMETRIC_BASE_XP, DEFAULT_GEOMETRIC_MAX_LEVEL, DEFAULT_GEOMETRIC_MULTIPLIER,
    STANDARD_LEVELS,
};
use crate::constants::{defaults, env_config, local_cache, persistence};
use crate::errors::{AppError, AppResult};
use crate::retry::RetryPolicy;
use ascend_leveling::{GeometricPolicy, LevelingPolicy, TieredPolicy};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Deployment environment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Type-safe durable store location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseUrl {
    /// `SQLite` database file
    SQLite {
        /// Path to the database file
        path: PathBuf,
    },
    /// In-memory `SQLite` (tests and dry runs)
    Memory,
}

impl DatabaseUrl {
    /// Parse a `DATABASE_URL` value
    ///
    /// Bare paths are treated as `SQLite` files.
    ///
    /// # Errors
    ///
    /// Returns a config error for non-`SQLite` URLs or an empty path
    pub fn parse_url(s: &str) -> AppResult<Self> {
        let trimmed = s.trim();
        if trimmed.starts_with("postgres://") || trimmed.starts_with("postgresql://") {
            return Err(AppError::config_invalid(
                "only sqlite: database URLs are supported",
            ));
        }
        let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
        let path_str = path_str.strip_prefix("//").unwrap_or(path_str);
        match path_str {
            "" => Err(AppError::config_invalid("database path is empty")),
            ":memory:" => Ok(Self::Memory),
            path => Ok(Self::SQLite {
                path: PathBuf::from(path),
            }),
        }
    }

    /// Convert to a `sqlx` connection string
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
            Self::Memory => "sqlite::memory:".to_owned(),
        }
    }

    /// Check if this is an in-memory database
    #[must_use]
    pub const fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }

    /// Create the parent directory of a file database if it is missing
    ///
    /// # Errors
    ///
    /// Returns a storage error if the directory cannot be created
    pub fn ensure_parent_dir(&self) -> AppResult<()> {
        if let Self::SQLite { path } = self {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::storage(format!(
                        "failed to create database directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }
        Ok(())
    }
}

impl Default for DatabaseUrl {
    fn default() -> Self {
        Self::parse_url(defaults::DATABASE_URL).unwrap_or(Self::Memory)
    }
}

impl fmt::Display for DatabaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_connection_string())
    }
}

/// Which leveling curve a deployment uses
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LevelingPolicyKind {
    /// Fixed ten-tier table
    #[default]
    Tiered,
    /// Geometric per-level growth
    Geometric,
}

impl LevelingPolicyKind {
    /// Configuration name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tiered => "tiered",
            Self::Geometric => "geometric",
        }
    }

    /// Parse a policy name
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` for anything other than `tiered` or `geometric`
    pub fn parse(s: &str) -> AppResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "tiered" | "table" => Ok(Self::Tiered),
            "geometric" => Ok(Self::Geometric),
            other => Err(AppError::config_invalid(format!(
                "unknown leveling policy '{other}', expected 'tiered' or 'geometric'"
            ))),
        }
    }
}

/// Parameters for [`GeometricPolicy`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometricConfig {
    /// XP needed to reach level 2
    pub base_xp: u64,
    /// Per-level increment growth factor
    pub multiplier: f64,
    /// Highest generated level
    pub max_level: u32,
}

impl Default for GeometricConfig {
    fn default() -> Self {
        Self {
            base_xp: DEFAULT_GEOMETRIC_BASE_XP,
            multiplier: DEFAULT_GEOMETRIC_MULTIPLIER,
            max_level: DEFAULT_GEOMETRIC_MAX_LEVEL,
        }
    }
}

/// Durable-write retry settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Total attempts per write, including the first
    pub max_attempts: u32,
    /// Backoff before the first retry
    pub base_delay_ms: u64,
    /// Backoff cap
    pub max_delay_ms: u64,
    /// Timeout applied to each attempt
    pub attempt_timeout_secs: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            max_attempts: persistence::DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: persistence::DEFAULT_BASE_DELAY_MS,
            max_delay_ms: persistence::DEFAULT_MAX_DELAY_MS,
            attempt_timeout_secs: persistence::DEFAULT_ATTEMPT_TIMEOUT_SECS,
        }
    }
}

impl PersistenceConfig {
    /// Build the retry policy used by the background persister
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            attempt_timeout: Duration::from_secs(self.attempt_timeout_secs),
            jitter: true,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionConfig {
    /// Deployment environment
    pub environment: Environment,
    /// Durable profile store location
    pub database_url: DatabaseUrl,
    /// Directory holding the local XP cache file
    pub cache_dir: PathBuf,
    /// Selected leveling curve
    pub leveling_policy: LevelingPolicyKind,
    /// Geometric curve parameters (used when `leveling_policy` is geometric)
    pub geometric: GeometricConfig,
    /// Durable-write retry settings
    pub persistence: PersistenceConfig,
    /// Record every award in the XP history ledger
    pub history_enabled: bool,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            database_url: DatabaseUrl::default(),
            cache_dir: default_cache_dir(),
            leveling_policy: LevelingPolicyKind::default(),
            geometric: GeometricConfig::default(),
            persistence: PersistenceConfig::default(),
            history_enabled: true,
        }
    }
}

impl ProgressionConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns a config error for an unsupported `DATABASE_URL` or an unknown
    /// `ASCEND_LEVELING_POLICY`
    pub fn from_env() -> AppResult<Self> {
        let defaults = Self::default();

        let database_url = match env::var(env_config::DATABASE_URL) {
            Ok(value) => DatabaseUrl::parse_url(&value)?,
            Err(_) => defaults.database_url,
        };
        let leveling_policy = match env::var(env_config::LEVELING_POLICY) {
            Ok(value) => LevelingPolicyKind::parse(&value)?,
            Err(_) => defaults.leveling_policy,
        };

        let geometric = GeometricConfig {
            base_xp: parse_env_or(env_config::GEOMETRIC_BASE, defaults.geometric.base_xp),
            multiplier: parse_env_or(
                env_config::GEOMETRIC_MULTIPLIER,
                defaults.geometric.multiplier,
            ),
            max_level: parse_env_or(
                env_config::GEOMETRIC_MAX_LEVEL,
                defaults.geometric.max_level,
            ),
        };

        let mut max_attempts = parse_env_or(
            env_config::PERSIST_MAX_RETRIES,
            defaults.persistence.max_attempts,
        );
        if max_attempts == 0 {
            warn!(
                key = env_config::PERSIST_MAX_RETRIES,
                "At least one persistence attempt is required, using default"
            );
            max_attempts = defaults.persistence.max_attempts;
        }
        let persistence = PersistenceConfig {
            max_attempts,
            base_delay_ms: parse_env_or(
                env_config::PERSIST_BASE_DELAY_MS,
                defaults.persistence.base_delay_ms,
            ),
            max_delay_ms: parse_env_or(
                env_config::PERSIST_MAX_DELAY_MS,
                defaults.persistence.max_delay_ms,
            ),
            attempt_timeout_secs: parse_env_or(
                env_config::PERSIST_TIMEOUT_SECS,
                defaults.persistence.attempt_timeout_secs,
            ),
        };

        let config = Self {
            environment: env::var(env_config::ENVIRONMENT)
                .map_or(defaults.environment, |v| Environment::from_str_or_default(&v)),
            database_url,
            cache_dir: env::var(env_config::CACHE_DIR)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map_or(defaults.cache_dir, PathBuf::from),
            leveling_policy,
            geometric,
            persistence,
            history_enabled: parse_bool_env_or(
                env_config::HISTORY_ENABLED,
                defaults.history_enabled,
            ),
        };

        info!("{}", config.summary());
        Ok(config)
    }

    /// Instantiate the configured leveling policy
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` if the geometric parameters are rejected
    pub fn build_policy(&self) -> AppResult<Arc<dyn LevelingPolicy>> {
        match self.leveling_policy {
            LevelingPolicyKind::Tiered => Ok(Arc::new(TieredPolicy::standard())),
            LevelingPolicyKind::Geometric => {
                let titles: Vec<&str> = STANDARD_LEVELS.iter().map(|&(_, title, _)| title).collect();
                let policy = GeometricPolicy::new(
                    self.geometric.base_xp,
                    self.geometric.multiplier,
                    self.geometric.max_level,
                    &titles,
                )?;
                Ok(Arc::new(policy))
            }
        }
    }

    /// Full path of the local XP cache file
    #[must_use]
    pub fn cache_file(&self) -> PathBuf {
        self.cache_dir.join(local_cache::CACHE_FILE_NAME)
    }

    /// One-line summary for startup logs
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Ascend configuration: environment={}, database={}, cache={}, policy={}, persist_attempts={}, history={}",
            self.environment,
            self.database_url,
            self.cache_file().display(),
            self.leveling_policy.as_str(),
            self.persistence.max_attempts,
            if self.history_enabled { "enabled" } else { "disabled" },
        )
    }
}

/// Default cache directory: the platform data dir plus `ascend/`
#[must_use]
pub fn default_cache_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| Path::new(".").to_path_buf())
        .join(local_cache::APP_DIR_NAME)
}

fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy + fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, default = %default, "Invalid value, using default");
            default
        }),
        Err(_) => default,
    }
}

fn parse_bool_env_or(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => true,
            "false" | "0" | "no" | "off" => false,
            _ => {
                warn!(key, value = %raw, default, "Invalid boolean, using default");
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            Environment::from_str_or_default("PROD"),
            Environment::Production
        );
        assert_eq!(
            Environment::from_str_or_default("test"),
            Environment::Testing
        );
        assert_eq!(
            Environment::from_str_or_default("anything"),
            Environment::Development
        );
    }

    #[test]
    fn test_database_url_parsing() {
        let file = DatabaseUrl::parse_url("sqlite:./data/ascend.db").unwrap();
        assert_eq!(file.to_connection_string(), "sqlite:./data/ascend.db");
        assert!(!file.is_memory());

        assert!(DatabaseUrl::parse_url("sqlite::memory:").unwrap().is_memory());
        assert!(DatabaseUrl::parse_url("./bare.db").is_ok());
        assert!(DatabaseUrl::parse_url("postgres://localhost/db").is_err());
        assert!(DatabaseUrl::parse_url("sqlite:").is_err());
    }

    #[test]
    fn test_policy_kind_parsing() {
        assert_eq!(
            LevelingPolicyKind::parse("Geometric").unwrap(),
            LevelingPolicyKind::Geometric
        );
        assert_eq!(
            LevelingPolicyKind::parse(" tiered ").unwrap(),
            LevelingPolicyKind::Tiered
        );
        assert!(LevelingPolicyKind::parse("linear").is_err());
    }

    #[test]
    fn test_build_policy_variants() {
        let mut config = ProgressionConfig::default();
        assert_eq!(config.build_policy().unwrap().name(), "tiered");

        config.leveling_policy = LevelingPolicyKind::Geometric;
        assert_eq!(config.build_policy().unwrap().name(), "geometric");

        config.geometric.multiplier = 0.5;
        assert!(config.build_policy().is_err());
    }

    #[test]
    fn test_retry_policy_from_persistence_config() {
        let retry = PersistenceConfig::default().retry_policy();
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.base_delay, Duration::from_millis(100));
        assert_eq!(retry.max_delay, Duration::from_secs(5));
        assert_eq!(retry.attempt_timeout, Duration::from_secs(5));
    }
}
