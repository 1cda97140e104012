// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Level table, XP rules, notification timings and persistence defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

//! Constants module
//!
//! The rule and level tables are hard-coded: they are not user-configurable
//! and changing them changes every stored user's level.

/// Fixed level table and geometric policy defaults
pub mod levels;
/// XP awarded per activity kind
pub mod xp_rules;

/// Presentation-layer notification timings
pub mod notifications {
    /// How long the "XP earned" toast stays visible
    pub const XP_TOAST_DURATION_MS: u64 = 2_000;
    /// How long the level-up celebration stays visible unless dismissed
    pub const LEVEL_UP_DURATION_MS: u64 = 8_000;
    /// Buffered events per broadcast subscriber before lagging
    pub const EVENT_CHANNEL_CAPACITY: usize = 64;
}

/// Durable write retry defaults
pub mod persistence {
    /// Attempts per durable write, including the first
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    /// Base delay for exponential backoff in milliseconds
    pub const DEFAULT_BASE_DELAY_MS: u64 = 100;
    /// Maximum backoff delay in milliseconds
    pub const DEFAULT_MAX_DELAY_MS: u64 = 5_000;
    /// Per-attempt timeout for durable store operations in seconds
    pub const DEFAULT_ATTEMPT_TIMEOUT_SECS: u64 = 5;
    /// Upper bound of random jitter added to each backoff in milliseconds
    pub const MAX_JITTER_MS: u64 = 100;
    /// Dead letters retained per engine; oldest dropped first
    pub const MAX_DEAD_LETTERS: usize = 100;
    /// Default number of history rows returned by recent-history queries
    pub const DEFAULT_HISTORY_LIMIT: u32 = 20;
}

/// Daily streak rules
pub mod streaks {
    /// A streak bonus is awarded on every multiple of this many consecutive days
    pub const STREAK_BONUS_INTERVAL_DAYS: u32 = 7;
}

/// Local cache layout
pub mod local_cache {
    /// Application directory under the platform data dir
    pub const APP_DIR_NAME: &str = "ascend";
    /// File holding the last known XP totals
    pub const CACHE_FILE_NAME: &str = "xp_cache.json";
}

/// Service identifiers for logging
pub mod service_names {
    /// Service name used in structured logs
    pub const ASCEND: &str = "ascend";
}

/// Environment variable names
pub mod env_config {
    /// Database connection URL
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// Directory for the local XP cache file
    pub const CACHE_DIR: &str = "ASCEND_CACHE_DIR";
    /// Leveling policy name (`tiered` or `geometric`)
    pub const LEVELING_POLICY: &str = "ASCEND_LEVELING_POLICY";
    /// First-level threshold for the geometric policy
    pub const GEOMETRIC_BASE: &str = "ASCEND_GEOMETRIC_BASE";
    /// Per-level multiplier for the geometric policy
    pub const GEOMETRIC_MULTIPLIER: &str = "ASCEND_GEOMETRIC_MULTIPLIER";
    /// Highest level for the geometric policy
    pub const GEOMETRIC_MAX_LEVEL: &str = "ASCEND_GEOMETRIC_MAX_LEVEL";
    /// Attempts per durable write
    pub const PERSIST_MAX_RETRIES: &str = "ASCEND_PERSIST_MAX_RETRIES";
    /// Base backoff delay
    pub const PERSIST_BASE_DELAY_MS: &str = "ASCEND_PERSIST_BASE_DELAY_MS";
    /// Backoff delay cap
    pub const PERSIST_MAX_DELAY_MS: &str = "ASCEND_PERSIST_MAX_DELAY_MS";
    /// Per-attempt durable write timeout
    pub const PERSIST_TIMEOUT_SECS: &str = "ASCEND_PERSIST_TIMEOUT_SECS";
    /// Whether award events are written to the history ledger
    pub const HISTORY_ENABLED: &str = "ASCEND_HISTORY_ENABLED";
    /// Deployment environment
    pub const ENVIRONMENT: &str = "ENVIRONMENT";
}

/// Default configuration values
pub mod defaults {
    /// Default database URL
    pub const DATABASE_URL: &str = "sqlite:./data/ascend.db";
}
