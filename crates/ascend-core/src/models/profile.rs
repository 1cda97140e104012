// ABOUTME: Durable per-user progression record held by the profile store
// ABOUTME: The level column is a denormalized copy, always written together with xp
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Durable XP and streak record for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileXp {
    /// Owner of the record
    pub user_id: Uuid,
    /// Cumulative XP total
    pub xp: u64,
    /// Level resolved from `xp` at write time
    pub level: u32,
    /// Consecutive active days
    pub streak_days: u32,
    /// Last day a login was recorded
    pub last_active_on: Option<NaiveDate>,
    /// Last write time
    pub updated_at: DateTime<Utc>,
}

impl ProfileXp {
    /// Fresh record for a newly created account
    #[must_use]
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            xp: 0,
            level: 1,
            streak_days: 0,
            last_active_on: None,
            updated_at: Utc::now(),
        }
    }
}
