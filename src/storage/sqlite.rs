// ABOUTME: SQLite-backed profile store and XP history ledger using sqlx
// ABOUTME: Upserts never lower a stored total; timestamps are stored as RFC3339 text
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

use super::{ProfileStore, XpHistorySink};
use crate::config::environment::DatabaseUrl;
use crate::errors::{AppError, AppResult};
use crate::models::{ProfileXp, XpActivity, XpAwardEvent};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

const STORE_NAME: &str = "sqlite";

/// `SQLite` adapter implementing [`ProfileStore`] and [`XpHistorySink`]
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect to the database and create the schema if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or migration fails
    pub async fn connect(url: &DatabaseUrl) -> AppResult<Self> {
        url.ensure_parent_dir()?;
        let options = SqliteConnectOptions::from_str(&url.to_connection_string())
            .map_err(|e| AppError::config_invalid(format!("Invalid database URL {url}: {e}")))?
            .create_if_missing(true);

        // Each in-memory connection is its own database, so keep exactly one alive
        let pool_options = if url.is_memory() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect to {url}: {e}")))?;

        let store = Self { pool };
        store.migrate().await?;
        info!(database = %url, "SQLite progression store ready");
        Ok(store)
    }

    /// Wrap an existing pool (schema must already exist or be migrated by the caller)
    #[must_use]
    pub const fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create tables and indexes
    ///
    /// # Errors
    ///
    /// Returns an error if any DDL statement fails
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS profiles (
                user_id TEXT PRIMARY KEY,
                xp INTEGER NOT NULL DEFAULT 0 CHECK (xp >= 0),
                level INTEGER NOT NULL DEFAULT 1,
                streak_days INTEGER NOT NULL DEFAULT 0,
                last_active_on TEXT,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create profiles table: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS xp_history (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                amount INTEGER NOT NULL CHECK (amount > 0),
                reason TEXT,
                total_after INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create xp_history table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_xp_history_user_created ON xp_history(user_id, created_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create xp_history index: {e}")))?;

        debug!("Progression schema migrated");
        Ok(())
    }

    /// Underlying connection pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Every stored profile, highest XP first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt
    pub async fn list_profiles(&self, limit: u32) -> AppResult<Vec<ProfileXp>> {
        let rows = sqlx::query(
            r"
            SELECT user_id, xp, level, streak_days, last_active_on, updated_at
            FROM profiles
            ORDER BY xp DESC, user_id ASC
            LIMIT $1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list profiles: {e}")))?;

        rows.iter().map(row_to_profile).collect()
    }
}

#[async_trait]
impl ProfileStore for SqliteStore {
    fn name(&self) -> &'static str {
        STORE_NAME
    }

    async fn load(&self, user_id: Uuid) -> AppResult<Option<ProfileXp>> {
        let row = sqlx::query(
            r"
            SELECT user_id, xp, level, streak_days, last_active_on, updated_at
            FROM profiles
            WHERE user_id = $1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load profile: {e}")))?;

        row.as_ref().map(row_to_profile).transpose()
    }

    async fn save_progress(&self, user_id: Uuid, xp: u64, level: u32) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO profiles (user_id, xp, level, streak_days, last_active_on, updated_at)
            VALUES ($1, $2, $3, 0, NULL, $4)
            ON CONFLICT(user_id) DO UPDATE SET
                xp = MAX(profiles.xp, excluded.xp),
                level = CASE WHEN excluded.xp >= profiles.xp THEN excluded.level ELSE profiles.level END,
                updated_at = excluded.updated_at
            ",
        )
        .bind(user_id.to_string())
        .bind(to_db_int(xp, "xp")?)
        .bind(i64::from(level))
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::database(format!("Failed to save progress: {e}")).with_user_id(user_id)
        })?;
        Ok(())
    }

    async fn save_streak(
        &self,
        user_id: Uuid,
        streak_days: u32,
        last_active_on: NaiveDate,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO profiles (user_id, xp, level, streak_days, last_active_on, updated_at)
            VALUES ($1, 0, 1, $2, $3, $4)
            ON CONFLICT(user_id) DO UPDATE SET
                streak_days = excluded.streak_days,
                last_active_on = excluded.last_active_on,
                updated_at = excluded.updated_at
            ",
        )
        .bind(user_id.to_string())
        .bind(i64::from(streak_days))
        .bind(last_active_on.to_string())
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::database(format!("Failed to save streak: {e}")).with_user_id(user_id)
        })?;
        Ok(())
    }
}

#[async_trait]
impl XpHistorySink for SqliteStore {
    async fn record(&self, event: &XpAwardEvent) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO xp_history (id, user_id, amount, reason, total_after, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT(id) DO NOTHING
            ",
        )
        .bind(event.id.to_string())
        .bind(event.user_id.to_string())
        .bind(to_db_int(event.amount, "amount")?)
        .bind(event.reason.as_ref().map(XpActivity::as_str))
        .bind(to_db_int(event.total_after, "total_after")?)
        .bind(format_timestamp(event.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to record XP history: {e}")))?;
        Ok(())
    }

    async fn xp_since(&self, user_id: Uuid, since: DateTime<Utc>) -> AppResult<u64> {
        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COALESCE(SUM(amount), 0)
            FROM xp_history
            WHERE user_id = $1 AND created_at >= $2
            ",
        )
        .bind(user_id.to_string())
        .bind(format_timestamp(since))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to sum XP history: {e}")))?;

        from_db_int(total, "xp_since")
    }

    async fn recent(&self, user_id: Uuid, limit: u32) -> AppResult<Vec<XpAwardEvent>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, amount, reason, total_after, created_at
            FROM xp_history
            WHERE user_id = $1
            ORDER BY created_at DESC, total_after DESC
            LIMIT $2
            ",
        )
        .bind(user_id.to_string())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to read XP history: {e}")))?;

        rows.iter().map(row_to_event).collect()
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    // Fixed width so lexical order in SQLite matches chronological order
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::database(format!("Invalid timestamp '{raw}': {e}")))
}

fn parse_uuid(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| AppError::database(format!("Invalid user id '{raw}': {e}")))
}

fn to_db_int(value: u64, field: &str) -> AppResult<i64> {
    i64::try_from(value)
        .map_err(|_| AppError::invalid_input(format!("{field} {value} exceeds SQLite INTEGER range")))
}

fn from_db_int(value: i64, field: &str) -> AppResult<u64> {
    u64::try_from(value)
        .map_err(|_| AppError::database(format!("Negative {field} stored: {value}")))
}

fn row_to_profile(row: &SqliteRow) -> AppResult<ProfileXp> {
    let user_id: String = row.get("user_id");
    let xp: i64 = row.get("xp");
    let level: i64 = row.get("level");
    let streak_days: i64 = row.get("streak_days");
    let last_active_on: Option<String> = row.get("last_active_on");
    let updated_at: String = row.get("updated_at");

    let last_active_on = last_active_on
        .map(|raw| {
            NaiveDate::from_str(&raw)
                .map_err(|e| AppError::database(format!("Invalid last_active_on '{raw}': {e}")))
        })
        .transpose()?;

    Ok(ProfileXp {
        user_id: parse_uuid(&user_id)?,
        xp: from_db_int(xp, "xp")?,
        level: u32::try_from(level)
            .map_err(|_| AppError::database(format!("Invalid level stored: {level}")))?,
        streak_days: u32::try_from(streak_days)
            .map_err(|_| AppError::database(format!("Invalid streak stored: {streak_days}")))?,
        last_active_on,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn row_to_event(row: &SqliteRow) -> AppResult<XpAwardEvent> {
    let id: String = row.get("id");
    let user_id: String = row.get("user_id");
    let amount: i64 = row.get("amount");
    let reason: Option<String> = row.get("reason");
    let total_after: i64 = row.get("total_after");
    let created_at: String = row.get("created_at");

    Ok(XpAwardEvent {
        id: Uuid::parse_str(&id)
            .map_err(|e| AppError::database(format!("Invalid history id '{id}': {e}")))?,
        user_id: parse_uuid(&user_id)?,
        amount: from_db_int(amount, "amount")?,
        reason: reason.as_deref().and_then(XpActivity::parse),
        total_after: from_db_int(total_after, "total_after")?,
        created_at: parse_timestamp(&created_at)?,
    })
}
