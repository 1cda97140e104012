// ABOUTME: Storage abstractions for durable profiles, the local XP cache and the history ledger
// ABOUTME: Async traits with SQLite, JSON-file and in-memory adapters
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

//! Storage layer
//!
//! The engine talks to three collaborators:
//!
//! - [`ProfileStore`]: durable per-user XP, level and streak (source of truth)
//! - [`LocalCache`]: device-local mirror of the last known XP total
//! - [`XpHistorySink`]: optional append-only ledger of awards
//!
//! Every adapter is cheap to share behind an `Arc`.

/// JSON file backed local cache
pub mod file_cache;
/// In-memory adapters for tests and ephemeral sessions
pub mod memory;
/// `SQLite` profile store and history ledger
pub mod sqlite;

pub use file_cache::FileLocalCache;
pub use memory::{InMemoryHistory, InMemoryLocalCache, InMemoryProfileStore, NoopHistory};
pub use sqlite::SqliteStore;

use crate::errors::AppResult;
use crate::models::{ProfileXp, XpAwardEvent};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Durable per-user progression record
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Store name used in logs and dead letters
    fn name(&self) -> &'static str;

    /// Load a user's profile, `None` if the user has never been saved
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached or the row is corrupt
    async fn load(&self, user_id: Uuid) -> AppResult<Option<ProfileXp>>;

    /// Write the XP total and its denormalized level
    ///
    /// Implementations never lower a stored total.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails
    async fn save_progress(&self, user_id: Uuid, xp: u64, level: u32) -> AppResult<()>;

    /// Write the login streak
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails
    async fn save_streak(
        &self,
        user_id: Uuid,
        streak_days: u32,
        last_active_on: NaiveDate,
    ) -> AppResult<()>;
}

/// Device-local mirror of the XP total
#[async_trait]
pub trait LocalCache: Send + Sync {
    /// Last cached total for a user
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be read
    async fn get_xp(&self, user_id: Uuid) -> AppResult<Option<u64>>;

    /// Replace the cached total for a user
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be written
    async fn set_xp(&self, user_id: Uuid, xp: u64) -> AppResult<()>;
}

/// Append-only XP award ledger
#[async_trait]
pub trait XpHistorySink: Send + Sync {
    /// Append an award
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be stored
    async fn record(&self, event: &XpAwardEvent) -> AppResult<()>;

    /// Sum of awards at or after `since`
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be queried
    async fn xp_since(&self, user_id: Uuid, since: DateTime<Utc>) -> AppResult<u64>;

    /// Most recent awards, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be queried
    async fn recent(&self, user_id: Uuid, limit: u32) -> AppResult<Vec<XpAwardEvent>>;
}
