// ABOUTME: Award event and outcome models for the XP transaction
// ABOUTME: XpAwardEvent feeds the optional history ledger; AwardOutcome goes back to the caller
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

use super::{ProgressionState, XpActivity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One XP award, as written to the history ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpAwardEvent {
    /// Unique event identifier
    pub id: Uuid,
    /// User who earned the XP
    pub user_id: Uuid,
    /// Positive XP amount
    pub amount: u64,
    /// Activity that triggered the award, if it came from the rule table
    pub reason: Option<XpActivity>,
    /// Cumulative total right after this award
    pub total_after: u64,
    /// When the award happened
    pub created_at: DateTime<Utc>,
}

impl XpAwardEvent {
    /// Create an event stamped with the current time
    #[must_use]
    pub fn new(user_id: Uuid, amount: u64, reason: Option<XpActivity>, total_after: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            amount,
            reason,
            total_after,
            created_at: Utc::now(),
        }
    }
}

/// Result of a successful award
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwardOutcome {
    /// Progression after the award
    pub new_state: ProgressionState,
    /// Level before the award
    pub previous_level: u32,
    /// Whether the award crossed at least one tier threshold
    pub leveled_up: bool,
}

impl AwardOutcome {
    /// Number of levels gained by this award
    #[must_use]
    pub const fn levels_gained(&self) -> u32 {
        self.new_state.level.saturating_sub(self.previous_level)
    }
}

/// Result of recording the first login of a day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLoginOutcome {
    /// Consecutive active days including today
    pub streak_days: u32,
    /// The daily login award
    pub login: AwardOutcome,
    /// Streak milestone bonus, when today completed an interval
    pub bonus: Option<AwardOutcome>,
}

impl DailyLoginOutcome {
    /// Progression after every award made for this login
    #[must_use]
    pub fn final_state(&self) -> &ProgressionState {
        self.bonus
            .as_ref()
            .map_or(&self.login.new_state, |bonus| &bonus.new_state)
    }

    /// Whether any award made for this login crossed a tier
    #[must_use]
    pub fn leveled_up(&self) -> bool {
        self.login.leveled_up || self.bonus.as_ref().is_some_and(|bonus| bonus.leveled_up)
    }
}
